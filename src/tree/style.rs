//! Helpers for the `property: value;` style strings carried by text nodes.

pub fn style_value<'a>(style: &'a str, property: &str) -> Option<&'a str> {
    style.split(';').find_map(|declaration| {
        let (name, value) = declaration.split_once(':')?;
        (name.trim() == property).then(|| value.trim())
    })
}

/// Returns `style` with `property` set to `value`, or removed when `value`
/// is `None`. Declaration order is preserved.
pub fn patch_style(style: &str, property: &str, value: Option<&str>) -> String {
    let mut declarations: Vec<(String, String)> = style
        .split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect();

    match value {
        Some(value) => {
            if let Some(entry) = declarations.iter_mut().find(|(name, _)| name == property) {
                entry.1 = value.to_string();
            } else {
                declarations.push((property.to_string(), value.to_string()));
            }
        }
        None => declarations.retain(|(name, _)| name != property),
    }

    declarations
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a `NNpx` size.
pub fn parse_px(value: &str) -> Option<u32> {
    value.trim().strip_suffix("px")?.trim().parse::<f32>().ok().map(|v| v.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_single_property() {
        let style = "color: red; font-size: 18px;";
        assert_eq!(style_value(style, "font-size"), Some("18px"));
        assert_eq!(style_value(style, "color"), Some("red"));
        assert_eq!(style_value(style, "background"), None);
    }

    #[test]
    fn patch_replaces_in_place() {
        let style = "color: red; font-size: 18px;";
        assert_eq!(
            patch_style(style, "font-size", Some("20px")),
            "color: red; font-size: 20px;"
        );
        assert_eq!(patch_style("", "font-size", Some("9px")), "font-size: 9px;");
        assert_eq!(patch_style(style, "color", None), "font-size: 18px;");
    }

    #[test]
    fn parses_pixel_sizes() {
        assert_eq!(parse_px("15px"), Some(15));
        assert_eq!(parse_px(" 12.5px "), Some(13));
        assert_eq!(parse_px("1em"), None);
    }
}
