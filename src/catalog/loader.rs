use crate::catalog::serializer;
use crate::error::Result;
use crate::types::{generated_id, ImageSlot, Product};
use csv::StringRecord;
use std::path::Path;
use tracing::{info, warn};

/// Recognized CSV layouts.
///
/// `Slotted` is this tool's own backup format (one `Image_N` column per
/// slot). `Bulk` is an e-commerce export with a single comma-separated
/// `Images` column. Files matching neither still load, just with all slots
/// empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvSchema {
    Slotted,
    Bulk,
}

/// Sniffs the schema from the header row.
pub fn detect_schema(headers: &StringRecord) -> Option<CsvSchema> {
    let has = |name: &str| headers.iter().any(|h| h.trim_start_matches('\u{feff}') == name);
    if has("Image_1") {
        Some(CsvSchema::Slotted)
    } else if has("Images") {
        Some(CsvSchema::Bulk)
    } else {
        None
    }
}

/// Loads the catalog, preferring the backup file over the original source.
///
/// Neither file existing is not an error: the catalog simply starts empty.
/// A `Bulk`-schema load immediately materializes a slotted backup so that
/// file becomes the preferred source on the next start.
pub fn load_catalog(source_csv: &Path, backup_csv: &Path) -> Result<Vec<Product>> {
    let file = if backup_csv.exists() {
        backup_csv
    } else if source_csv.exists() {
        source_csv
    } else {
        info!("No catalog CSV found, starting empty");
        return Ok(Vec::new());
    };

    info!(file = %file.display(), "Loading catalog");

    // Flexible: exports in the wild pad or truncate trailing cells
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(file)?;
    let headers = reader.headers()?.clone();
    let schema = detect_schema(&headers);
    match schema {
        Some(CsvSchema::Slotted) => info!("CSV format: slotted backup"),
        Some(CsvSchema::Bulk) => info!("CSV format: bulk export"),
        None => warn!("CSV format not recognized, loading rows without images"),
    }

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == name)
    };
    let col_name = column("Name");
    let col_id = column("ID");
    let col_sku = column("SKU");
    let col_short = column("Short description");
    let col_desc = column("Description");
    let col_price = column("Regular price");
    let col_sale = column("Sale price");
    let col_images = column("Images");
    let col_slots: Vec<Option<usize>> = (1..=4).map(|n| column(&format!("Image_{n}"))).collect();

    let cell = |record: &StringRecord, col: Option<usize>| -> String {
        col.and_then(|i| record.get(i)).unwrap_or("").trim().to_string()
    };

    let mut products = Vec::new();
    for record in reader.records() {
        let record = record?;

        // Rows without a name are not products
        let name = cell(&record, col_name);
        if name.is_empty() {
            continue;
        }

        let id = match (cell(&record, col_id), cell(&record, col_sku)) {
            (id, _) if !id.is_empty() => id,
            (_, sku) if !sku.is_empty() => sku,
            _ => generated_id(),
        };

        let mut product = Product::new(id, &name);
        product.short_description = cell(&record, col_short);
        product.description = cell(&record, col_desc);
        product.price = cell(&record, col_price);
        product.sale_price = cell(&record, col_sale);

        match schema {
            Some(CsvSchema::Slotted) => {
                for (i, col) in col_slots.iter().enumerate() {
                    let filename = cell(&record, *col);
                    if !filename.is_empty() {
                        product.images[i] = ImageSlot::filled(filename);
                    }
                }
            }
            Some(CsvSchema::Bulk) => {
                let urls = cell(&record, col_images);
                for (i, url) in urls
                    .split(',')
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .take(4)
                    .enumerate()
                {
                    if let Some(filename) = url_filename(url) {
                        product.images[i] = ImageSlot::filled(filename);
                    }
                }
            }
            None => {}
        }

        products.push(product);
    }

    info!(count = products.len(), "Catalog loaded");

    // A bulk load is one-way: rewrite it as a slotted backup right away so
    // restarts pick up the backup instead
    if schema == Some(CsvSchema::Bulk) {
        if let Err(e) = serializer::write_backup(&products, backup_csv) {
            warn!("Failed to write initial backup CSV: {e}");
        }
    }

    Ok(products)
}

/// Extracts the filename portion of an image URL, dropping any query string.
fn url_filename(url: &str) -> Option<String> {
    let without_query = url.split('?').next().unwrap_or(url);
    let filename = without_query.rsplit('/').next().unwrap_or(without_query);
    if filename.is_empty() {
        None
    } else {
        Some(filename.to_string())
    }
}
