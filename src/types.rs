use crate::constants;
use chrono::Utc;
use rand::Rng;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::sync::atomic::{AtomicU64, Ordering};

/// One of the four fixed image positions attached to a product.
///
/// A filled slot carries the bare stored filename plus a freshness token;
/// it serializes to the served path `/images/{filename}?v={token}` so the
/// browser refetches whenever the underlying file changes. An empty slot
/// serializes to `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageSlot {
    #[default]
    Empty,
    Filled { filename: String, token: i64 },
}

impl ImageSlot {
    pub fn filled(filename: impl Into<String>) -> Self {
        ImageSlot::Filled {
            filename: filename.into(),
            token: freshness_token(),
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, ImageSlot::Filled { .. })
    }

    /// Bare stored filename, if the slot is filled.
    pub fn filename(&self) -> Option<&str> {
        match self {
            ImageSlot::Empty => None,
            ImageSlot::Filled { filename, .. } => Some(filename),
        }
    }

    /// Client-facing URL, or `""` for an empty slot.
    pub fn served_path(&self) -> String {
        match self {
            ImageSlot::Empty => String::new(),
            ImageSlot::Filled { filename, token } => {
                format!("{}/{}?v={}", constants::IMAGE_ROUTE, filename, token)
            }
        }
    }
}

impl Serialize for ImageSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.served_path())
    }
}

/// A catalog product with its four image slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub price: String,
    pub sale_price: String,
    pub slug: String,
    pub images: [ImageSlot; 4],
}

impl Product {
    pub fn new(id: String, name: &str) -> Self {
        Self {
            id,
            slug: slugify(name),
            name: name.trim().to_string(),
            short_description: String::new(),
            description: String::new(),
            price: String::new(),
            sale_price: String::new(),
            images: Default::default(),
        }
    }

    /// Number of populated slots, in [0,4].
    pub fn image_count(&self) -> usize {
        self.images.iter().filter(|s| s.is_filled()).count()
    }

    /// Canonical stored filename for a slot of this product.
    pub fn stored_filename(&self, index: usize) -> String {
        format!("{}-{}.{}", self.slug, index + 1, constants::IMAGE_EXT)
    }
}

impl Serialize for Product {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Product", 8)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("short_description", &self.short_description)?;
        s.serialize_field("description", &self.description)?;
        s.serialize_field("price", &self.price)?;
        s.serialize_field("sale_price", &self.sale_price)?;
        s.serialize_field("slug", &self.slug)?;
        s.serialize_field("images", &self.images)?;
        s.end()
    }
}

/// Freshness token appended to served paths to defeat client-side caching.
pub fn freshness_token() -> i64 {
    Utc::now().timestamp_millis()
}

/// Fallback product ID for rows with neither an ID nor a SKU column.
///
/// Timestamp plus random component, with a process-local sequence number so
/// two rows generated in the same millisecond never collide. Not stable
/// across restarts.
pub fn generated_id() -> String {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    let noise: u16 = rand::thread_rng().gen();
    format!("id_{}_{}{}", Utc::now().timestamp_millis(), seq, noise)
}

/// Derives a URL/filename-safe slug from a product name.
///
/// Diacritics are folded to ASCII (Latin-1 plus the Vietnamese vowel/tone
/// combinations), non-alphanumeric runs collapse to a single hyphen, the
/// result is lower-cased and trimmed of leading/trailing hyphens. An empty
/// result falls back to a fixed default.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars().flat_map(char::to_lowercase).map(fold_diacritic) {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    if out.is_empty() {
        constants::SLUG_FALLBACK.to_string()
    } else {
        out
    }
}

/// Folds a lower-case accented character to its ASCII base letter.
fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' | 'ả' | 'ạ' | 'ằ' | 'ắ' | 'ẳ'
        | 'ẵ' | 'ặ' | 'ầ' | 'ấ' | 'ẩ' | 'ẫ' | 'ậ' => 'a',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' | 'ẻ' | 'ẽ' | 'ẹ' | 'ề' | 'ế'
        | 'ể' | 'ễ' | 'ệ' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ỉ' | 'ị' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' | 'ơ' | 'ỏ' | 'ọ' | 'ồ' | 'ố'
        | 'ổ' | 'ỗ' | 'ộ' | 'ờ' | 'ớ' | 'ở' | 'ỡ' | 'ợ' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' | 'ư' | 'ủ' | 'ụ' | 'ừ'
        | 'ứ' | 'ử' | 'ữ' | 'ự' => 'u',
        'ý' | 'ÿ' | 'ỳ' | 'ỷ' | 'ỹ' | 'ỵ' => 'y',
        'đ' => 'd',
        'ç' | 'ć' | 'č' => 'c',
        'ñ' | 'ń' | 'ň' => 'n',
        'ś' | 'š' => 's',
        'ź' | 'ż' | 'ž' => 'z',
        'ł' => 'l',
        'ß' => 's',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_strips_diacritics_and_collapses_runs() {
        assert_eq!(slugify("Áo Thun Nam — Đẹp!"), "ao-thun-nam-dep");
        assert_eq!(slugify("  Widget   2000  "), "widget-2000");
        assert_eq!(slugify("Café crème"), "cafe-creme");
    }

    #[test]
    fn slugify_trims_boundary_hyphens() {
        assert_eq!(slugify("--hello--"), "hello");
        assert_eq!(slugify("(parens)"), "parens");
    }

    #[test]
    fn slugify_falls_back_when_nothing_survives() {
        assert_eq!(slugify("!!!"), "product");
        assert_eq!(slugify(""), "product");
    }

    #[test]
    fn generated_ids_are_unique_within_process() {
        let a = generated_id();
        let b = generated_id();
        assert_ne!(a, b);
        assert!(a.starts_with("id_"));
    }

    #[test]
    fn slot_serializes_to_served_path() {
        let slot = ImageSlot::Filled { filename: "widget-1.jpg".into(), token: 42 };
        assert_eq!(slot.served_path(), "/images/widget-1.jpg?v=42");
        assert_eq!(serde_json::to_string(&slot).unwrap(), "\"/images/widget-1.jpg?v=42\"");
        assert_eq!(serde_json::to_string(&ImageSlot::Empty).unwrap(), "\"\"");
    }

    #[test]
    fn products_always_have_four_slots() {
        let product = Product::new("p1".into(), "Widget");
        assert_eq!(product.images.len(), 4);
        assert_eq!(product.image_count(), 0);
        assert_eq!(product.stored_filename(0), "widget-1.jpg");
        assert_eq!(product.stored_filename(3), "widget-4.jpg");
    }
}
