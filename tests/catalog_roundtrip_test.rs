use anyhow::Result;
use product_image_tool::catalog::{load_catalog, serializer, CatalogStore};
use product_image_tool::types::{ImageSlot, Product};
use std::collections::BTreeMap;
use std::fs;
use tempfile::tempdir;

fn product(id: &str, name: &str, filenames: &[&str]) -> Product {
    let mut p = Product::new(id.to_string(), name);
    for (i, filename) in filenames.iter().enumerate() {
        p.images[i] = ImageSlot::filled(filename.to_string());
    }
    p
}

fn slot_filenames(products: &[Product]) -> BTreeMap<String, Vec<Option<String>>> {
    products
        .iter()
        .map(|p| {
            (
                p.id.clone(),
                p.images.iter().map(|s| s.filename().map(str::to_string)).collect(),
            )
        })
        .collect()
}

#[test]
fn serialize_then_reload_reproduces_slot_assignments() -> Result<()> {
    let dir = tempdir()?;
    let source = dir.path().join("products.csv");
    let backup = dir.path().join("products_with_images.csv");

    let products = vec![
        product("1", "Alpha Widget", &["alpha-widget-1.jpg", "alpha-widget-2.jpg"]),
        product("2", "Bánh Mì Kit", &[]),
        product("3", "Gamma", &["gamma-1.jpg", "gamma-2.jpg", "gamma-3.jpg", "gamma-4.jpg"]),
    ];

    serializer::write_backup(&products, &backup)?;

    // Loader must pick the backup (slotted detection) over the source file
    fs::write(&source, "Name,Images\nShould Not Load,\n")?;
    let reloaded = load_catalog(&source, &backup)?;

    assert_eq!(slot_filenames(&reloaded), slot_filenames(&products));
    assert_eq!(reloaded[1].slug, "banh-mi-kit");
    for p in &reloaded {
        assert_eq!(p.images.len(), 4);
    }
    Ok(())
}

#[test]
fn bulk_export_loads_and_becomes_the_preferred_backup() -> Result<()> {
    let dir = tempdir()?;
    let source = dir.path().join("products.csv");
    let backup = dir.path().join("products_with_images.csv");

    fs::write(
        &source,
        "ID,Name,Regular price,Images\n\
         11,Widget,9.99,\"http://x/a.jpg?foo,http://x/b.png\"\n\
         12,Empty One,5.00,\n",
    )?;

    let products = load_catalog(&source, &backup)?;
    assert_eq!(products.len(), 2);
    let widget = &products[0];
    assert_eq!(widget.images[0].filename(), Some("a.jpg"));
    assert_eq!(widget.images[1].filename(), Some("b.png"));
    assert!(widget.images[0].served_path().starts_with("/images/a.jpg?v="));
    assert!(!widget.images[2].is_filled());

    // The bulk load wrote a slotted backup; a second load must go through it
    // and keep the same assignments
    assert!(backup.exists());
    let reloaded = load_catalog(&source, &backup)?;
    assert_eq!(slot_filenames(&reloaded), slot_filenames(&products));
    Ok(())
}

#[test]
fn store_mutations_rewrite_the_backup() -> Result<()> {
    let dir = tempdir()?;
    let backup = dir.path().join("products_with_images.csv");

    let store = CatalogStore::new(
        vec![product("1", "Widget", &["widget-1.jpg"])],
        backup.clone(),
    );

    store.set_slot("1", 1, ImageSlot::filled("widget-2.jpg"))?;
    let content = fs::read_to_string(&backup)?;
    assert!(content.contains("widget-1.jpg"));
    assert!(content.contains("widget-2.jpg"));

    store.clear_slot("1", 0)?;
    let content = fs::read_to_string(&backup)?;
    assert!(!content.contains("widget-1.jpg"));
    assert!(content.contains("widget-2.jpg"));
    Ok(())
}
