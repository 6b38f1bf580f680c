use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Produces an SVG document whose only content is the given PNG.
pub fn embed_raster(png: &[u8], width: u32, height: u32) -> Vec<u8> {
    let encoded = STANDARD.encode(png);
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<svg xmlns=\"http://www.w3.org/2000/svg\" ",
            "width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            "  <image width=\"{w}\" height=\"{h}\" ",
            "href=\"data:image/png;base64,{data}\"/>\n",
            "</svg>\n"
        ),
        w = width,
        h = height,
        data = encoded
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embeds_dimensions_and_payload() {
        let svg = String::from_utf8(embed_raster(b"png", 12, 7)).unwrap();
        assert!(svg.contains("viewBox=\"0 0 12 7\""));
        assert!(svg.contains("base64,cG5n"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
