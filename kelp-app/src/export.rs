//! CSV export for a subcategory's stock
//!
//! UTF-8 with a byte-order-mark prefix and CRLF row separators, so the
//! file opens cleanly in spreadsheet tools.

use shared::models::{Product, Size};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Render the stock table for `products` as CSV bytes
///
/// Header is `Name,Image URL,<each size>`; one row per product.
pub fn stock_csv(products: &[Product]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(UTF8_BOM);

    let mut header: Vec<String> = vec!["Name".to_string(), "Image URL".to_string()];
    header.extend(Size::ALL.iter().map(|s| s.to_string()));
    push_row(&mut out, &header);

    for product in products {
        let mut row: Vec<String> = vec![
            product.name.clone(),
            product.image_url.clone().unwrap_or_default(),
        ];
        row.extend(
            Size::ALL
                .iter()
                .map(|s| product.sizes.quantity(*s).to_string()),
        );
        push_row(&mut out, &row);
    }
    out
}

/// Download filename for a subcategory export
///
/// Filesystem-unsafe characters are stripped and whitespace runs collapse
/// to underscores.
pub fn export_filename(category: &str, subcategory: &str) -> String {
    sanitize(&format!("{category}_{subcategory}_stock.csv"))
}

fn push_row(out: &mut Vec<u8>, fields: &[String]) {
    let line = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    out.extend_from_slice(line.as_bytes());
    out.extend_from_slice(b"\r\n");
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn sanitize(name: &str) -> String {
    let stripped: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();
    let mut out = String::with_capacity(stripped.len());
    let mut in_whitespace = false;
    for c in stripped.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
                in_whitespace = true;
            }
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::SizeChart;

    fn product(name: &str, image_url: Option<&str>, sizes: SizeChart) -> Product {
        Product {
            id: "p1".to_string(),
            name: name.to_string(),
            sku: "SKU-1".to_string(),
            category: "Shoes".to_string(),
            subcategory: "Default".to_string(),
            sizes,
            price: Decimal::from(50),
            description: None,
            image_url: image_url.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_csv_layout() {
        let products = [product(
            "Runner",
            None,
            SizeChart::default().with(Size::M, 1),
        )];
        let bytes = stock_csv(&products);
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        let text = std::str::from_utf8(&bytes[3..]).unwrap();
        assert_eq!(
            text,
            "Name,Image URL,XS,S,M,L,XL,XXL,3XL\r\nRunner,,0,0,1,0,0,0,0\r\n"
        );
    }

    #[test]
    fn test_fields_with_commas_and_quotes_are_escaped() {
        let products = [product(
            "Runner, \"Pro\"",
            Some("http://example.com/a.png"),
            SizeChart::default(),
        )];
        let bytes = stock_csv(&products);
        let text = std::str::from_utf8(&bytes[3..]).unwrap();
        assert!(text.contains("\"Runner, \"\"Pro\"\"\",http://example.com/a.png"));
    }

    #[test]
    fn test_filename_sanitized() {
        assert_eq!(
            export_filename("Shoes / Boots", "All Weather"),
            "Shoes_Boots_All_Weather_stock.csv"
        );
    }
}
