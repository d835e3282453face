use super::parse::parse_glyph;
use super::*;
use crate::error::ErrorKind;
use crate::QuoteChar;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn parse() {
    let bytes = include_bytes!("../../testdata/sample_period.glif");
    let glyph = parse_glyph(bytes).unwrap();
    assert_eq!(glyph.glyph_name, "period");
    assert_eq!(glyph.format_version, 2);
    assert_eq!(glyph.unicodes, vec!["002E".to_string()]);
    assert_eq!(glyph.advance_width, 268);
    assert_eq!(glyph.advance_height, 1000);
    assert_eq!(glyph.outline_data.contours.len(), 1);
    assert_eq!(glyph.outline_data.contours[0].points.len(), 12);
    assert_eq!(
        glyph.outline_data.contours[0].points[0],
        ContourPoint::new(237.0, 152.0, Some(PointType::Curve), Some(true))
    );
    assert_eq!(glyph.outline_data.contours[0].points[2], ContourPoint::new(134.5, 187.0, None, None));
    assert_eq!(glyph.properties.note.as_deref(), Some("Sketched by hand."));
    assert_eq!(
        glyph.properties.anchors,
        vec![Anchor { x: 134.0, y: 0.0, name: Some("bottom".into()) }]
    );
    assert_eq!(
        serde_json::Value::Object(glyph.properties.lib.clone()),
        json!({"com.example.flag": true, "com.example.note": "kept & escaped"})
    );
}

#[test]
fn parse_v1() {
    let bytes = include_bytes!("../../testdata/glifv1.glif");
    let glyph = parse_glyph(bytes).unwrap();
    assert_eq!(glyph.format_version, 1);
    assert_eq!(glyph.outline_data.contours.len(), 2);
    assert_eq!(glyph.outline_data.contours[0].points[0].typ, Some(PointType::Move));
    assert_eq!(glyph.advance_width, 600);
    assert_eq!(glyph.advance_height, 1000);
}

#[test]
fn missing_advance_uses_default_metric() {
    let data = r#"<?xml version="1.0" encoding="UTF-8"?>
<glyph name="space" format="2">
  <unicode hex="0020"/>
</glyph>
"#;
    let glyph = Glyph::parse_glif(data.as_bytes(), 2048).unwrap();
    assert_eq!(glyph.advance_width, 2048);
    assert_eq!(glyph.advance_height, 2048);
    assert!(glyph.is_empty());
    assert_eq!(serde_json::to_value(&glyph.outline_data).unwrap(), json!({}));
}

#[test]
fn only_first_advance_counts() {
    let data = r#"<glyph name="a" format="2">
  <advance height="900.6"/>
  <advance width="10" height="10"/>
</glyph>"#;
    let glyph = parse_glyph(data.as_bytes()).unwrap();
    assert_eq!(glyph.advance_width, 1000);
    assert_eq!(glyph.advance_height, 901);
}

#[test]
fn unparsable_format_defaults_to_one() {
    let data = r#"<glyph name="a" format="two"><outline/></glyph>"#;
    let glyph = parse_glyph(data.as_bytes()).unwrap();
    assert_eq!(glyph.format_version, 1);
}

#[test]
fn unicodes_keep_document_order() {
    let data = r#"<glyph name="quotes" format="2">
  <unicode hex="201C"/>
  <unicode hex="0022"/>
  <unicode hex="201D"/>
</glyph>"#;
    let glyph = parse_glyph(data.as_bytes()).unwrap();
    assert_eq!(glyph.unicodes, vec!["201C", "0022", "201D"]);
}

#[test]
fn components_keep_only_present_fields() {
    let data = r#"<glyph name="Aacute" format="2">
  <outline>
    <component base="A"/>
    <component base="acute" xScale="0.5" yOffset="-20"/>
  </outline>
</glyph>"#;
    let glyph = parse_glyph(data.as_bytes()).unwrap();
    let components = &glyph.outline_data.components;
    assert_eq!(components[0], Component::new("A"));
    assert_eq!(
        components[1],
        Component { x_scale: Some(0.5), y_offset: Some(-20.0), ..Component::new("acute") }
    );
    assert_eq!(
        serde_json::to_value(&glyph.outline_data).unwrap(),
        json!({"components": [{"base": "A"}, {"base": "acute", "xScale": 0.5, "yOffset": -20.0}]})
    );
}

#[test]
fn point_json_shape() {
    let data = r#"<glyph name="l" format="2">
  <outline>
    <contour>
      <point x="10" y="0" type="line" smooth="no"/>
      <point x="10" y="700"/>
    </contour>
    <contour/>
  </outline>
</glyph>"#;
    let glyph = parse_glyph(data.as_bytes()).unwrap();
    assert_eq!(
        serde_json::to_value(&glyph.outline_data).unwrap(),
        json!({"contours": [
            {"points": [
                {"x": 10.0, "y": 0.0, "type": "line", "smooth": false},
                {"x": 10.0, "y": 700.0}
            ]},
            {"points": []}
        ]})
    );
}

#[test]
fn malformed_glyphs() {
    let truncated = r#"<glyph name="period" format="2">
  <outline>
    <contour>
      <point x="237" y="152"/>
"#;
    assert!(parse_glyph(truncated.as_bytes()).is_err());

    let bad_point = r#"<glyph name="a"><outline><contour><point x="1"/></contour></outline></glyph>"#;
    assert!(matches!(parse_glyph(bad_point.as_bytes()), Err(DocumentError::Parse(ErrorKind::BadPoint))));

    let bad_number = r#"<glyph name="a"><outline><contour><point x="1" y="one"/></contour></outline></glyph>"#;
    assert!(matches!(
        parse_glyph(bad_number.as_bytes()),
        Err(DocumentError::Parse(ErrorKind::BadNumber))
    ));

    let no_base = r#"<glyph name="a"><outline><component xOffset="1"/></outline></glyph>"#;
    assert!(matches!(
        parse_glyph(no_base.as_bytes()),
        Err(DocumentError::Parse(ErrorKind::ComponentMissingBase))
    ));

    let not_a_glyph = r#"<plist version="1.0"><dict/></plist>"#;
    assert!(matches!(
        parse_glyph(not_a_glyph.as_bytes()),
        Err(DocumentError::Parse(ErrorKind::WrongFirstElement))
    ));
}

#[test]
fn unlisted_point_types_are_kept() {
    let data = r#"<glyph name="a" format="2">
  <outline>
    <contour>
      <point x="1" y="2" type="Curve"/>
      <point x="3" y="4" type="spline" smooth="yes"/>
    </contour>
  </outline>
</glyph>"#;
    let glyph = parse_glyph(data.as_bytes()).unwrap();
    let points = &glyph.outline_data.contours[0].points;
    assert_eq!(points[0].typ, Some(PointType::Other("Curve".into())));
    assert_eq!(points[1].typ, Some(PointType::Other("spline".into())));
    assert_eq!(
        serde_json::to_value(&points[0]).unwrap(),
        json!({"x": 1.0, "y": 2.0, "type": "Curve"})
    );

    let text = String::from_utf8(glyph.encode_xml().unwrap()).unwrap();
    assert!(text.contains("<point x=\"1\" y=\"2\" type=\"Curve\"/>"));
    assert!(text.contains("<point x=\"3\" y=\"4\" type=\"spline\" smooth=\"yes\"/>"));
    assert_eq!(parse_glyph(text.as_bytes()).unwrap().outline_data, glyph.outline_data);
}

#[test]
fn point_types_from_json() {
    let point: ContourPoint = serde_json::from_value(json!({"x": 1, "y": 2, "type": "foo"})).unwrap();
    assert_eq!(point.typ, Some(PointType::Other("foo".into())));
    let point: ContourPoint = serde_json::from_value(json!({"x": 1, "y": 2, "type": "qcurve"})).unwrap();
    assert_eq!(point.typ, Some(PointType::QCurve));
    assert_eq!("offcurve".parse::<PointType>(), Ok(PointType::OffCurve));
}

#[test]
fn unknown_elements_are_skipped() {
    let data = r#"<glyph name="a" format="2">
  <guideline x="10" name="stem"/>
  <image fileName="sketch.png"/>
  <outline>
    <contour>
      <point x="1" y="2" type="line"/>
    </contour>
    <unknown><point x="1" y="2"/></unknown>
  </outline>
  <extra>text</extra>
</glyph>"#;
    let glyph = parse_glyph(data.as_bytes()).unwrap();
    assert_eq!(glyph.outline_data.contours.len(), 1);
    assert!(glyph.properties.anchors.is_empty());
}

#[test]
fn bad_lib_is_ignored() {
    let data = r#"<glyph name="a" format="2">
  <outline/>
  <lib><array><string>not a dict</string></array></lib>
</glyph>"#;
    let glyph = parse_glyph(data.as_bytes()).unwrap();
    assert!(glyph.properties.lib.is_empty());
}

#[test]
fn save() {
    let bytes = include_bytes!("../../testdata/sample_period.glif");
    let glyph = parse_glyph(bytes).unwrap();
    let encoded = glyph.encode_xml().unwrap();
    let text = String::from_utf8(encoded.clone()).unwrap();
    assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(text.contains("<glyph name=\"period\" format=\"2\">"));
    assert!(text.contains("<advance width=\"268\" height=\"1000\"/>"));
    assert!(text.contains("<point x=\"134.5\" y=\"187\"/>"));
    assert!(text.contains("<point x=\"237\" y=\"152\" type=\"curve\" smooth=\"yes\"/>"));

    let reparsed = parse_glyph(&encoded).unwrap();
    assert_eq!(reparsed, Glyph { format_version: 2, ..glyph });
}

#[test]
fn save_v1_as_v2() {
    let bytes = include_bytes!("../../testdata/glifv1.glif");
    let glyph = parse_glyph(bytes).unwrap();
    let reparsed = parse_glyph(&glyph.encode_xml().unwrap()).unwrap();
    assert_eq!(reparsed.format_version, 2);
    assert_eq!(reparsed.outline_data, glyph.outline_data);
}

#[test]
fn save_only_present_component_fields() {
    let mut glyph = Glyph::new("Aacute");
    glyph.outline_data.components.push(Component::new("A"));
    glyph.outline_data.components.push(Component { x_offset: Some(450.0), ..Component::new("acute") });
    let text = String::from_utf8(glyph.encode_xml().unwrap()).unwrap();
    assert!(text.contains("<component base=\"A\"/>"));
    assert!(text.contains("<component base=\"acute\" xOffset=\"450\"/>"));
}

#[test]
fn save_with_options() {
    let mut glyph = Glyph::new("a");
    glyph.unicodes.push("0061".into());
    let options = WriteOptions::default().whitespace("  ").quote_char(QuoteChar::Single);
    let text = String::from_utf8(glyph.encode_glif(&options).unwrap()).unwrap();
    assert_eq!(
        text,
        "<?xml version='1.0' encoding='UTF-8'?>
<glyph name=\"a\" format=\"2\">
  <advance width=\"1000\" height=\"1000\"/>
  <unicode hex=\"0061\"/>
  <outline/>
</glyph>
"
    );
}

#[test]
fn save_lib() {
    let mut glyph = Glyph::new("a");
    glyph.properties.lib.insert("com.example.blob".into(), json!("DATA:aGVsbG8="));
    glyph.properties.lib.insert("com.example.count".into(), json!(3));
    let encoded = glyph.encode_xml().unwrap();
    let text = String::from_utf8(encoded.clone()).unwrap();
    assert!(text.contains("aGVsbG8="));

    let reparsed = parse_glyph(&encoded).unwrap();
    assert_eq!(reparsed.properties.lib, glyph.properties.lib);
}

#[test]
fn json_shape() {
    let mut glyph = Glyph::new("a");
    glyph.sort_order = Some(3);
    assert_eq!(
        serde_json::to_value(&glyph).unwrap(),
        json!({
            "glyphName": "a",
            "unicodes": [],
            "advanceWidth": 1000,
            "advanceHeight": 1000,
            "formatVersion": 2,
            "layerName": "public.default",
            "sortOrder": 3,
            "outlineData": {},
            "properties": {}
        })
    );
}
