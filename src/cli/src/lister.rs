//! Incremental image listing.
//!
//! Pages are pulled from the registry one at a time and written out as soon
//! as they arrive; nothing is buffered beyond the current page.

use std::io::Write;

use futures::StreamExt;
use porter_core::error::Result;
use porter_runtime::{ImageDetail, ImageFilter, RegistryImages};

use crate::output;

const HEADERS: [&str; 5] = ["REPOSITORY", "TAG", "DIGEST", "PUSHED", "SIZE"];
/// Column widths shared by the header and every page. Longer cells are
/// truncated so that separately printed pages stay aligned.
const WIDTHS: [u16; 5] = [32, 20, 19, 16, 10];

/// How listed images are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListMode {
    /// Aligned columns under a header line
    Table,
    /// Digests only, one per line
    Quiet,
    /// A `{{.Field}}` template per image
    Format(String),
}

/// Writes the images of a registry to a sink.
pub struct ImageLister<'a> {
    registry: &'a dyn RegistryImages,
    mode: ListMode,
}

impl<'a> ImageLister<'a> {
    pub fn new(registry: &'a dyn RegistryImages, mode: ListMode) -> Self {
        Self { registry, mode }
    }

    /// List images matching `filter` into `sink` and return how many were
    /// written. A failing page ends the listing with its error; lines
    /// already written stay written.
    pub async fn list<W: Write>(&self, filter: &ImageFilter, sink: &mut W) -> Result<usize> {
        if self.mode == ListMode::Table {
            let mut header = output::new_table(Some(&HEADERS[..]));
            output::set_min_widths(&mut header, &WIDTHS);
            writeln!(sink, "{header}")?;
        }

        let mut pages = self.registry.images(filter);
        let mut written = 0;
        while let Some(page) = pages.next().await {
            let page = page?;
            if page.is_empty() {
                continue;
            }
            self.write_page(&page, sink)?;
            sink.flush()?;
            written += page.len();
        }

        tracing::debug!(images = written, "Listing finished");
        Ok(written)
    }

    fn write_page<W: Write>(&self, page: &[ImageDetail], sink: &mut W) -> Result<()> {
        match self.mode {
            ListMode::Quiet => {
                for image in page {
                    writeln!(sink, "{}", image.digest)?;
                }
            }
            ListMode::Format(ref template) => {
                for image in page {
                    writeln!(sink, "{}", ImageRow::from_detail(image).apply_format(template))?;
                }
            }
            ListMode::Table => {
                let mut table = output::new_table(None);
                for image in page {
                    let row = ImageRow::from_detail(image);
                    let cells = [row.repository, row.tag, row.digest, row.pushed, row.size];
                    table.add_row(
                        cells
                            .iter()
                            .zip(WIDTHS)
                            .map(|(cell, width)| output::truncate(cell, width as usize)),
                    );
                }
                output::set_min_widths(&mut table, &WIDTHS);
                writeln!(sink, "{table}")?;
            }
        }
        Ok(())
    }
}

/// Display fields of one listed image.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ImageRow {
    repository: String,
    tag: String,
    digest: String,
    pushed: String,
    size: String,
}

impl ImageRow {
    fn from_detail(image: &ImageDetail) -> Self {
        let tag = if image.tags.is_empty() {
            "<none>".to_string()
        } else {
            image.tags.join(",")
        };

        Self {
            repository: image.repository.clone(),
            tag,
            digest: output::short_digest(&image.digest),
            pushed: image
                .pushed_at
                .as_ref()
                .map(output::format_ago)
                .unwrap_or_else(|| "-".to_string()),
            size: image
                .size_bytes
                .map(output::format_bytes)
                .unwrap_or_else(|| "-".to_string()),
        }
    }

    /// Replace `{{.Field}}` placeholders.
    fn apply_format(&self, template: &str) -> String {
        template
            .replace("{{.Repository}}", &self.repository)
            .replace("{{.Tag}}", &self.tag)
            .replace("{{.Digest}}", &self.digest)
            .replace("{{.Pushed}}", &self.pushed)
            .replace("{{.Size}}", &self.size)
    }
}
