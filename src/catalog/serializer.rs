use crate::error::Result;
use crate::types::Product;
use std::path::Path;

/// Column order of the canonical slotted backup schema.
const HEADERS: [&str; 10] = [
    "ID",
    "Name",
    "Regular price",
    "Sale price",
    "Short description",
    "Description",
    "Image_1",
    "Image_2",
    "Image_3",
    "Image_4",
];

/// Writes the whole catalog to `path` in the slotted schema.
///
/// Image cells hold bare filenames, no path prefix and no freshness token.
/// The file is overwritten in full on every call.
pub fn write_backup(products: &[Product], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADERS)?;
    for product in products {
        let mut record = vec![
            product.id.clone(),
            product.name.clone(),
            product.price.clone(),
            product.sale_price.clone(),
            product.short_description.clone(),
            product.description.clone(),
        ];
        for slot in &product.images {
            record.push(slot.filename().unwrap_or("").to_string());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ImageSlot, Product};
    use std::fs;

    #[test]
    fn backup_holds_bare_filenames() {
        let mut product = Product::new("7".into(), "Café Widget");
        product.price = "9.99".into();
        product.images[0] = ImageSlot::Filled { filename: "cafe-widget-1.jpg".into(), token: 1 };
        product.images[2] = ImageSlot::Filled { filename: "cafe-widget-3.jpg".into(), token: 2 };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.csv");
        write_backup(&[product], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ID,Name,Regular price,Sale price,Short description,Description,Image_1,Image_2,Image_3,Image_4"
        );
        assert_eq!(
            lines.next().unwrap(),
            "7,Café Widget,9.99,,,,cafe-widget-1.jpg,,cafe-widget-3.jpg,"
        );
    }
}
