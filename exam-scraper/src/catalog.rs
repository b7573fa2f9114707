use std::fs;
use std::path::{Component, Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Year → Subject → listing URLs, one URL per quarter in quarter order.
///
/// Iteration follows table order. In TOML the table is written as
/// `[[year]]` entries, each holding `[[year.subject]]` entries.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Catalog {
    #[serde(rename = "year")]
    pub years: Vec<Year>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Year {
    pub name: String,
    #[serde(rename = "subject", default)]
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Subject {
    pub name: String,
    /// Listing URLs; index 0 is quarter 1.
    pub quarters: Vec<String>,
}

impl Subject {
    /// `(quarter number, url)` pairs, numbered from 1.
    pub fn quarter_urls(&self) -> impl Iterator<Item = (usize, &str)> {
        self.quarters
            .iter()
            .enumerate()
            .map(|(index, url)| (index + 1, url.as_str()))
    }
}

/// Year and subject names become one directory level each under the root.
fn check_dir_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(anyhow::anyhow!("name is empty"));
    }
    let mut components = Path::new(name).components();
    let single_normal = matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none();
    if !single_normal || name.contains(['/', '\\']) {
        return Err(anyhow::anyhow!(
            "{:?} must be a single directory name without separators",
            name
        ));
    }
    Ok(())
}

impl Catalog {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let catalog: Catalog = toml::from_str(text).context("Failed to parse catalog TOML")?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Invalid catalog file: {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.years.is_empty() {
            return Err(anyhow::anyhow!("Catalog has no years"));
        }
        for year in &self.years {
            check_dir_name(&year.name).with_context(|| "Catalog has an invalid year name")?;
            for subject in &year.subjects {
                check_dir_name(&subject.name)
                    .with_context(|| format!("Year {:?} has an invalid subject name", year.name))?;
                if subject.quarters.is_empty() {
                    return Err(anyhow::anyhow!(
                        "Subject {:?} in {:?} has no quarter URLs",
                        subject.name,
                        year.name
                    ));
                }
            }
        }
        Ok(())
    }

    /// Total number of listing pages.
    pub fn listing_count(&self) -> usize {
        self.years
            .iter()
            .flat_map(|year| &year.subjects)
            .map(|subject| subject.quarters.len())
            .sum()
    }

    /// The table of 9raya.tn exam listings for the first three primary years.
    pub fn builtin() -> Self {
        fn subject(name: &str, quarters: [&str; 3]) -> Subject {
            Subject {
                name: name.to_string(),
                quarters: quarters.iter().map(|url| url.to_string()).collect(),
            }
        }

        fn year(name: &str, subjects: Vec<Subject>) -> Year {
            Year {
                name: name.to_string(),
                subjects,
            }
        }

        Catalog {
            years: vec![
                year(
                    "First Year",
                    vec![
                        subject(
                            "Mathematics",
                            [
                                "https://9raya.tn/إمتحانات-الرياضيات-الثلاثي-الأول/?_sft_category=اولى-اساسي&_sft_trimestre=الثلاثي-الأول&_sft_matiere=رياضيات",
                                "https://9raya.tn/إمتحانات-رياضيات-الثلاثي-الثاني-2/?_sft_category=اولى-اساسي&_sft_trimestre=الثلاثي-الثاني&_sft_matiere=رياضيات",
                                "https://9raya.tn/إمتحانات-رياضيات-الثلاثي-الثالث/?_sft_category=اولى-اساسي&_sft_trimestre=الثلاثي-الثالث&_sft_matiere=رياضيات",
                            ],
                        ),
                        subject(
                            "Science",
                            [
                                "https://9raya.tn/إمتحانات-إيقاظ-علمي-الثلاثي-الأول-2/?_sft_category=اولى-اساسي&_sft_trimestre=الثلاثي-الأول&_sft_matiere=ايقاظ-علمي",
                                "https://9raya.tn/إمتحانات-إيقاظ-علمي-الثلاثي-الثاني-2/?_sft_category=اولى-اساسي&_sft_trimestre=الثلاثي-الثاني&_sft_matiere=ايقاظ-علمي",
                                "https://9raya.tn/إمتحانات-الايقاظ-العلمي-الثلاثي-الثا/?_sft_category=اولى-اساسي&_sft_trimestre=الثلاثي-الثالث&_sft_matiere=ايقاظ-علمي",
                            ],
                        ),
                    ],
                ),
                year(
                    "Second Year",
                    vec![
                        subject(
                            "Mathematics",
                            [
                                "https://9raya.tn/امتحانات-في-الرياضيات-الثلاثي-الأول/?_sft_category=ثانية-اساسي&_sft_trimestre=الثلاثي-الأول&_sft_matiere=رياضيات",
                                "https://9raya.tn/إمتحانات-رياضيات-الثلاثي-الثاني-3/?_sft_category=ثانية-اساسي&_sft_trimestre=الثلاثي-الثاني&_sft_matiere=رياضيات",
                                "https://9raya.tn/إمتحانات-الرياضيات-الثلاثي-الثالث/?_sft_category=ثانية-اساسي&_sft_trimestre=الثلاثي-الثالث&_sft_matiere=رياضيات",
                            ],
                        ),
                        subject(
                            "Science",
                            [
                                "https://9raya.tn/إمتحانات-الإيقاظ-العلمي-الثلاثي-الأو/?_sft_category=ثانية-اساسي&_sft_trimestre=الثلاثي-الأول&_sft_matiere=ايقاظ-علمي",
                                "https://9raya.tn/السنة-الثانية-إمتحانات-الرياضيات-الث/?_sft_category=ثانية-اساسي&_sft_trimestre=الثلاثي-الثاني&_sft_matiere=ايقاظ-علمي",
                                "https://9raya.tn/جديد-2019-إمتحان-إيقاظ-علمي-الثلاثي-الثال/?_sft_category=ثانية-اساسي&_sft_trimestre=الثلاثي-الثالث&_sft_matiere=ايقاظ-علمي",
                            ],
                        ),
                    ],
                ),
                year(
                    "Third Year",
                    vec![
                        subject(
                            "Mathematics",
                            [
                                "https://9raya.tn/إمتحانات-رياضيات-الإصلاح/?_sft_category=ثالثة-اساسي&_sft_trimestre=الثلاثي-الأول&_sft_matiere=رياضيات",
                                "https://9raya.tn/إمتحانات-رياضيات-الإصلاح-الثلاثي-الث/?_sft_category=ثالثة-اساسي&_sft_trimestre=الثلاثي-الثاني&_sft_matiere=رياضيات",
                                "https://9raya.tn/إختبارات-رياضيات-الثلاثي-الثالث/?_sft_category=ثالثة-اساسي&_sft_trimestre=الثلاثي-الثالث&_sft_matiere=رياضيات",
                            ],
                        ),
                        subject(
                            "Science",
                            [
                                "https://9raya.tn/إمتحانات-إيقاظ-علمي-مع-الإصلاح/?_sft_category=ثالثة-اساسي&_sft_trimestre=الثلاثي-الأول&_sft_matiere=ايقاظ-علمي",
                                "https://9raya.tn/إمتحانات-إيقاظ-علمي-الإصلاح-الثلاثي/?_sft_category=ثالثة-اساسي&_sft_trimestre=الثلاثي-الثاني&_sft_matiere=ايقاظ-علمي",
                                "https://9raya.tn/امتحانات-سنة-ثالثة-الثلاثي-الثالث/?_sft_category=ثالثة-اساسي&_sft_trimestre=الثلاثي-الثالث&_sft_matiere=ايقاظ-علمي",
                            ],
                        ),
                        subject(
                            "French",
                            [
                                "https://9raya.tn/إمتحانات-فرنسية-جديد-الثلاثي-الأول/?_sft_category=ثالثة-اساسي&_sft_trimestre=الثلاثي-الأول&_sft_matiere=فرنسية",
                                "https://9raya.tn/امتحانات-السنة-الثالثة-ابتدائي/?_sft_category=ثالثة-اساسي&_sft_trimestre=الثلاثي-الثاني&_sft_matiere=فرنسية",
                                "https://9raya.tn/إمتحانات-الثلاثي-الثالث-في-اللغة-الفرنسية/?_sft_category=ثالثة-اساسي&_sft_trimestre=الثلاثي-الثالث&_sft_matiere=فرنسية",
                            ],
                        ),
                    ],
                ),
            ],
        }
    }
}
