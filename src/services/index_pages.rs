//! Static HTML index pages for browsing the library over HTTP.
//!
//! One `index.html` is written into every non-hidden directory of the
//! library. Each page lists the directory's PDFs with the title and authors
//! recorded in the catalog, and links to its subdirectories and its parent.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use tracing::info;

use crate::error::IndexError;
use crate::models::PaperRecord;
use crate::sources::PdfLocator;

/// Bootstrap-styled page used when no custom template is given.
pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/index.html");

pub const INDEX_FILE_NAME: &str = "index.html";

const TEMPLATE_NAME: &str = "index.html";
const NO_TITLE: &str = "No Title";
const UNKNOWN_AUTHORS: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// URL the library root is served under, e.g. `http://raspberrypi.local`.
    pub server_url: String,
    /// Prefix of catalog paths that stands for the library root, for catalogs
    /// built on another machine or mount point.
    pub original_prefix: Option<String>,
    /// Template source replacing [`DEFAULT_TEMPLATE`].
    pub template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfEntry {
    pub filename: String,
    pub url: String,
    pub title: String,
    pub authors: String,
}

/// The context a template is rendered with for one directory.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryPage {
    #[serde(skip)]
    pub dir: PathBuf,
    pub is_root: bool,
    pub directory_name: String,
    pub server_url: String,
    pub parent_url: Option<String>,
    pub breadcrumbs: Vec<Link>,
    pub directories: Vec<Link>,
    pub pdf_files: Vec<PdfEntry>,
    pub generation_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    pub pages: u64,
    pub pdf_files: u64,
    /// PDFs that had a catalog record.
    pub described: u64,
}

struct Description {
    title: String,
    authors: String,
}

pub struct IndexGenerator {
    env: Environment<'static>,
    server_url: String,
    original_prefix: Option<String>,
}

impl IndexGenerator {
    /// Compile the template; syntax errors surface here, before any page is written.
    pub fn new(options: IndexOptions) -> Result<Self, IndexError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        let source = options
            .template
            .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());
        env.add_template_owned(TEMPLATE_NAME, source)?;

        Ok(Self {
            env,
            server_url: options.server_url.trim_end_matches('/').to_string(),
            original_prefix: options.original_prefix,
        })
    }

    /// Build the page model of every directory under the locator's root.
    pub fn pages(&self, locator: &PdfLocator, records: &[PaperRecord]) -> Vec<DirectoryPage> {
        let root = locator.root();
        let descriptions = self.describe(root, records);
        let generation_date = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let directories: Vec<PathBuf> = locator.directories().collect();
        let mut pdfs_by_dir: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
        for pdf in locator.iter() {
            if let Some(parent) = pdf.parent() {
                pdfs_by_dir.entry(parent.to_path_buf()).or_default().push(pdf);
            }
        }

        directories
            .iter()
            .map(|dir| {
                let components = components(root, dir);
                let children = directories
                    .iter()
                    .filter(|child| child.parent() == Some(dir.as_path()))
                    .map(|child| {
                        let name = file_name(child);
                        Link {
                            url: self.url_for(&components, Some(&name)),
                            name,
                        }
                    })
                    .collect();

                let mut pdfs = pdfs_by_dir.remove(dir).unwrap_or_default();
                pdfs.sort();
                let pdf_files = pdfs
                    .iter()
                    .map(|pdf| {
                        let filename = file_name(pdf);
                        let (title, authors) = match descriptions.get(pdf) {
                            Some(d) => (d.title.clone(), d.authors.clone()),
                            None => (NO_TITLE.to_string(), UNKNOWN_AUTHORS.to_string()),
                        };
                        PdfEntry {
                            url: self.url_for(&components, Some(&filename)),
                            filename,
                            title,
                            authors,
                        }
                    })
                    .collect();

                let breadcrumbs = (0..components.len())
                    .map(|i| Link {
                        name: components[i].clone(),
                        url: self.url_for(&components[..=i], None),
                    })
                    .collect();

                let is_root = components.is_empty();
                DirectoryPage {
                    dir: dir.clone(),
                    is_root,
                    directory_name: if is_root {
                        "Root".to_string()
                    } else {
                        components.join("/")
                    },
                    server_url: self.server_url.clone(),
                    parent_url: (!is_root)
                        .then(|| self.url_for(&components[..components.len() - 1], None)),
                    breadcrumbs,
                    directories: children,
                    pdf_files,
                    generation_date: generation_date.clone(),
                }
            })
            .collect()
    }

    pub fn render(&self, page: &DirectoryPage) -> Result<String, IndexError> {
        let template = self.env.get_template(TEMPLATE_NAME)?;
        Ok(template.render(page)?)
    }

    /// Render and write `index.html` into every directory.
    pub fn generate(
        &self,
        locator: &PdfLocator,
        records: &[PaperRecord],
    ) -> Result<IndexSummary, IndexError> {
        let mut summary = IndexSummary::default();

        for page in self.pages(locator, records) {
            let html = self.render(&page)?;
            let target = page.dir.join(INDEX_FILE_NAME);
            std::fs::write(&target, html)?;
            info!(path = %target.display(), files = page.pdf_files.len(), "wrote index page");

            summary.pages += 1;
            summary.pdf_files += page.pdf_files.len() as u64;
            summary.described += page
                .pdf_files
                .iter()
                .filter(|pdf| pdf.title != NO_TITLE || pdf.authors != UNKNOWN_AUTHORS)
                .count() as u64;
        }

        Ok(summary)
    }

    /// Key catalog records by the local path they describe.
    fn describe(&self, root: &Path, records: &[PaperRecord]) -> HashMap<PathBuf, Description> {
        records
            .iter()
            .map(|record| {
                let path = Path::new(&record.path);
                let local = match self
                    .original_prefix
                    .as_deref()
                    .and_then(|prefix| path.strip_prefix(prefix).ok())
                {
                    Some(rest) => root.join(rest),
                    None => path.to_path_buf(),
                };
                let authors = record.authors_column();
                let description = Description {
                    title: if record.title.is_empty() {
                        NO_TITLE.to_string()
                    } else {
                        record.title.clone()
                    },
                    authors: if authors.is_empty() {
                        UNKNOWN_AUTHORS.to_string()
                    } else {
                        authors
                    },
                };
                (local, description)
            })
            .collect()
    }

    fn url_for(&self, components: &[String], leaf: Option<&str>) -> String {
        let mut url = self.server_url.clone();
        for part in components.iter().map(String::as_str).chain(leaf) {
            url.push('/');
            url.push_str(part);
        }
        url
    }
}

/// Path components of `dir` below `root`.
fn components(root: &Path, dir: &Path) -> Vec<String> {
    dir.strip_prefix(root)
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}
