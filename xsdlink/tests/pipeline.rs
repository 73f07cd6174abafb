//! End-to-end conversion tests: XSD on disk to LinkML YAML and back through
//! the verifier.

use pretty_assertions::assert_eq;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use xsdlink::prelude::*;

const OME: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
        xmlns:ome="http://www.openmicroscopy.org/Schemas/OME/2016-06"
        targetNamespace="http://www.openmicroscopy.org/Schemas/OME/2016-06">
    <xs:simpleType name="UnitsLength">
        <xs:restriction base="xs:string">
            <xs:enumeration value="µm"/>
            <xs:enumeration value="m"/>
            <xs:enumeration value="2nd order"/>
        </xs:restriction>
    </xs:simpleType>
    <xs:complexType name="BaseType">
        <xs:attribute name="Name" type="xs:string"/>
    </xs:complexType>
    <xs:complexType name="Channel">
        <xs:attribute name="ID" type="xs:ID" use="required"/>
        <xs:attribute name="SamplesPerPixel" type="xs:int"/>
    </xs:complexType>
    <xs:complexType name="Pixels">
        <xs:annotation><xs:documentation>Pixel data.</xs:documentation></xs:annotation>
        <xs:complexContent>
            <xs:extension base="ome:BaseType">
                <xs:sequence>
                    <xs:element name="Channel" type="ome:Channel" minOccurs="0" maxOccurs="unbounded"/>
                </xs:sequence>
                <xs:attribute name="ID" type="xs:ID" use="required"/>
                <xs:attribute name="SizeX" type="xs:positiveInteger" use="required"/>
                <xs:attribute name="PhysicalSizeXUnit" type="ome:UnitsLength"/>
            </xs:extension>
        </xs:complexContent>
    </xs:complexType>
    <xs:complexType name="Plate">
        <xs:attribute name="Rows" type="xs:int"/>
    </xs:complexType>
    <xs:element name="Image">
        <xs:complexType>
            <xs:sequence><xs:element name="Pixels" type="ome:Pixels"/></xs:sequence>
            <xs:attribute name="AcquisitionDate" type="xs:dateTime"/>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;

const COLLIDING: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:c="urn:c" targetNamespace="urn:c">
    <xs:simpleType name="Foo.Bar">
        <xs:restriction base="xs:string"><xs:enumeration value="A"/></xs:restriction>
    </xs:simpleType>
    <xs:complexType name="Foo-Bar">
        <xs:attribute name="Kind" type="c:Foo.Bar"/>
    </xs:complexType>
    <xs:complexType name="Foo_Bar">
        <xs:attribute name="Left" type="xs:string"/>
        <xs:attribute name="Right" type="xs:string"/>
    </xs:complexType>
</xs:schema>"#;

const SAME_NAMED_LOCALS: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:l">
    <xs:complexType name="Image">
        <xs:sequence>
            <xs:element name="Pixels"><xs:complexType><xs:attribute name="A" type="xs:int"/></xs:complexType></xs:element>
        </xs:sequence>
    </xs:complexType>
    <xs:element name="Image">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="Pixels">
                    <xs:complexType>
                        <xs:attribute name="B" type="xs:int"/>
                        <xs:attribute name="C" type="xs:int"/>
                    </xs:complexType>
                </xs:element>
            </xs:sequence>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;

const IMPORTED: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:o">
    <xs:complexType name="Foo">
        <xs:attribute name="X" type="xs:int"/>
        <xs:attribute name="Y" type="xs:int"/>
        <xs:attribute name="Z" type="xs:int"/>
    </xs:complexType>
</xs:schema>"#;

const IMPORTING: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:t="urn:t" xmlns:o="urn:o" targetNamespace="urn:t">
    <xs:import namespace="urn:o" schemaLocation="other.xsd"/>
    <xs:complexType name="Foo"><xs:attribute name="A" type="xs:int"/></xs:complexType>
    <xs:complexType name="User">
        <xs:sequence>
            <xs:element name="Mine" type="t:Foo"/>
            <xs:element name="Theirs" type="o:Foo"/>
        </xs:sequence>
    </xs:complexType>
</xs:schema>"#;

const UNRESOLVED: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:u="urn:u" targetNamespace="urn:u">
    <xs:complexType name="Detector">
        <xs:attribute name="Type" type="u:DetectorType"/>
    </xs:complexType>
</xs:schema>"#;

fn write_xsd(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write");
    path
}

fn read_yaml(path: &Path) -> Value {
    let content = fs::read_to_string(path).expect("Failed to read");
    serde_yaml::from_str(&content).expect("Failed to parse YAML")
}

fn keys(value: &Value) -> Vec<String> {
    value
        .as_mapping()
        .map(|m| m.keys().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

#[test]
fn test_inheritance_identifier_and_cardinality() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let xsd = write_xsd(&dir, "ome.xsd", OME);
    let output = dir.path().join("ome.yaml");

    convert(&xsd, &output, &GeneratorConfig::default()).expect("Failed to convert");
    let doc = read_yaml(&output);

    assert_eq!(doc["name"].as_str(), Some("ome"));
    assert_eq!(doc["default_prefix"].as_str(), Some("ome"));
    assert_eq!(doc["default_range"].as_str(), Some("string"));

    let pixels = &doc["classes"]["Pixels"];
    assert_eq!(pixels["is_a"].as_str(), Some("BaseType"));
    assert_eq!(pixels["description"].as_str(), Some("Pixel data."));

    let id = &pixels["attributes"]["id"];
    assert_eq!(id["identifier"].as_bool(), Some(true));
    assert_eq!(id["required"].as_bool(), Some(true));

    let channel = &pixels["attributes"]["channel"];
    assert_eq!(channel["range"].as_str(), Some("Channel"));
    assert_eq!(channel["multivalued"].as_bool(), Some(true));
    assert_eq!(channel["required"].as_bool(), Some(false));

    let size_x = &pixels["attributes"]["size_x"];
    assert_eq!(size_x["range"].as_str(), Some("integer"));
    assert_eq!(size_x["required"].as_bool(), Some(true));

    assert_eq!(
        pixels["attributes"]["physical_size_x_unit"]["range"].as_str(),
        Some("UnitsLength")
    );
    assert_eq!(
        doc["classes"]["Image"]["annotations"]["xsd_source"].as_str(),
        Some("element:Image")
    );
}

#[test]
fn test_element_closure() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let xsd = write_xsd(&dir, "ome.xsd", OME);
    let output = dir.path().join("image.yaml");

    let config = GeneratorConfig::new().with_elements(["Image"]);
    convert(&xsd, &output, &config).expect("Failed to convert");
    let doc = read_yaml(&output);

    let mut classes = keys(&doc["classes"]);
    classes.sort();
    assert_eq!(classes, vec!["BaseType", "Channel", "Image", "Pixels"]);
    assert_eq!(keys(&doc["enums"]), vec!["UnitsLength"]);

    let report = verify(&xsd, &output, &VerifyOptions { allow_subset: true })
        .expect("Failed to verify");
    assert!(report.passed());
    assert_eq!(report.only_in_xsd, vec!["complexType:Plate".to_string()]);

    let strict = verify(&xsd, &output, &VerifyOptions::default()).expect("Failed to verify");
    assert!(!strict.passed());
}

#[test]
fn test_unknown_element_is_rejected() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let xsd = write_xsd(&dir, "ome.xsd", OME);
    let output = dir.path().join("none.yaml");

    let config = GeneratorConfig::new().with_elements(["Screen"]);
    let err = convert(&xsd, &output, &config).unwrap_err();
    assert_eq!(err.to_string(), "unknown element or type 'Screen'");
    assert!(!output.exists());
}

#[test]
fn test_name_collision() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let xsd = write_xsd(&dir, "c.xsd", COLLIDING);
    let output = dir.path().join("c.yaml");

    let conversion = convert(&xsd, &output, &GeneratorConfig::default()).expect("Failed to convert");
    let renamed: Vec<(&str, &str)> = conversion
        .generated
        .warnings
        .iter()
        .map(|w| (w.original.as_str(), w.assigned.as_str()))
        .collect();
    assert_eq!(renamed, vec![("Foo-Bar", "Foo_Bar_2"), ("Foo.Bar", "Foo_Bar_3")]);

    let doc = read_yaml(&output);
    let mut classes = keys(&doc["classes"]);
    classes.sort();
    assert_eq!(classes, vec!["Foo_Bar", "Foo_Bar_2"]);
    assert_eq!(keys(&doc["enums"]), vec!["Foo_Bar_3"]);
    assert_eq!(
        doc["classes"]["Foo_Bar_2"]["attributes"]["kind"]["range"].as_str(),
        Some("Foo_Bar_3")
    );
    assert_eq!(
        doc["classes"]["Foo_Bar_2"]["annotations"]["xsd_source"].as_str(),
        Some("complexType:Foo-Bar")
    );
    assert_eq!(
        doc["classes"]["Foo_Bar"]["annotations"]["xsd_source"].as_str(),
        Some("complexType:Foo_Bar")
    );

    let report = verify(&xsd, &output, &VerifyOptions::default()).expect("Failed to verify");
    assert!(report.passed(), "{report}");
    assert_eq!(report.complex_types, 2);
    assert_eq!(report.top_level_elements, 0);
    let matched: Vec<(&str, &str, usize, usize)> = report
        .matched
        .iter()
        .map(|m| {
            (
                m.identity.as_str(),
                m.class_name.as_str(),
                m.expected.total(),
                m.actual,
            )
        })
        .collect();
    assert_eq!(
        matched,
        vec![
            ("complexType:Foo-Bar", "Foo_Bar_2", 1, 1),
            ("complexType:Foo_Bar", "Foo_Bar", 2, 2),
        ]
    );
    let text = report.to_string();
    assert!(text.lines().any(|l| l.starts_with("complexType:Foo-Bar") && l.contains("Foo_Bar_2")));
    assert!(text.lines().any(|l| l.starts_with("complexType:Foo_Bar") && l.ends_with("ok")));
}

#[test]
fn test_same_named_locals_verify() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let xsd = write_xsd(&dir, "l.xsd", SAME_NAMED_LOCALS);
    let output = dir.path().join("l.yaml");

    convert(&xsd, &output, &GeneratorConfig::default()).expect("Failed to convert");
    let report = verify(&xsd, &output, &VerifyOptions::default()).expect("Failed to verify");
    assert!(report.passed(), "{report}");
    assert!(report.duplicates.is_empty());

    let locals: Vec<(&str, usize)> = report
        .matched
        .iter()
        .filter(|m| m.identity.starts_with("local:"))
        .map(|m| (m.identity.as_str(), m.actual))
        .collect();
    assert_eq!(
        locals,
        vec![
            ("local:complexType:Image/Pixels", 1),
            ("local:element:Image/Pixels", 2),
        ]
    );
}

#[test]
fn test_imported_name_clash_verifies() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write_xsd(&dir, "other.xsd", IMPORTED);
    let xsd = write_xsd(&dir, "root.xsd", IMPORTING);
    let output = dir.path().join("root.yaml");

    convert(&xsd, &output, &GeneratorConfig::default()).expect("Failed to convert");
    let doc = read_yaml(&output);
    let sources: Vec<String> = keys(&doc["classes"])
        .iter()
        .filter_map(|name| doc["classes"][name.as_str()]["annotations"]["xsd_source"].as_str())
        .map(str::to_string)
        .collect();
    assert!(sources.contains(&"complexType:{urn:t}Foo".to_string()));
    assert!(sources.contains(&"complexType:{urn:o}Foo".to_string()));

    let report = verify(&xsd, &output, &VerifyOptions::default()).expect("Failed to verify");
    assert!(report.passed(), "{report}");
    assert_eq!(report.complex_types, 3);
    assert_eq!(report.matched.len(), 3);
}

#[test]
fn test_optional_identifier_is_not_required() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let plate_with_id = OME.replace(
        r#"<xs:attribute name="Rows" type="xs:int"/>"#,
        r#"<xs:attribute name="ID" type="xs:ID"/><xs:attribute name="Rows" type="xs:int"/>"#,
    );
    let xsd = write_xsd(&dir, "ome.xsd", &plate_with_id);
    let output = dir.path().join("ome.yaml");
    convert(&xsd, &output, &GeneratorConfig::default()).expect("Failed to convert");

    let doc = read_yaml(&output);
    let id = &doc["classes"]["Plate"]["attributes"]["id"];
    assert_eq!(id["identifier"].as_bool(), Some(true));
    assert_ne!(id["required"].as_bool(), Some(true));
}

#[test]
fn test_output_is_idempotent() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let xsd = write_xsd(&dir, "ome.xsd", OME);

    let first = dir.path().join("first.yaml");
    let second = dir.path().join("second.yaml");
    convert(&xsd, &first, &GeneratorConfig::default()).expect("Failed to convert");
    convert(&xsd, &second, &GeneratorConfig::default()).expect("Failed to convert");
    assert_eq!(
        fs::read(&first).expect("Failed to read"),
        fs::read(&second).expect("Failed to read")
    );

    let config = GeneratorConfig::new().with_partition(true);
    let a = convert(&xsd, &dir.path().join("a"), &config).expect("Failed to convert");
    let b = convert(&xsd, &dir.path().join("b"), &config).expect("Failed to convert");
    assert_eq!(a.written.len(), b.written.len());
    for (left, right) in a.written.iter().zip(&b.written) {
        assert_eq!(left.file_name(), right.file_name());
        assert_eq!(
            fs::read(left).expect("Failed to read"),
            fs::read(right).expect("Failed to read")
        );
    }
}

#[test]
fn test_enum_values_are_kept_verbatim() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let xsd = write_xsd(&dir, "ome.xsd", OME);
    let output = dir.path().join("ome.yaml");

    convert(&xsd, &output, &GeneratorConfig::default()).expect("Failed to convert");
    let doc = read_yaml(&output);
    assert_eq!(
        keys(&doc["enums"]["UnitsLength"]["permissible_values"]),
        vec!["µm", "m", "2nd order"]
    );
}

#[test]
fn test_single_and_partitioned_outputs_verify() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let xsd = write_xsd(&dir, "ome.xsd", OME);

    let single = dir.path().join("ome.yaml");
    convert(&xsd, &single, &GeneratorConfig::default()).expect("Failed to convert");
    let report = verify(&xsd, &single, &VerifyOptions::default()).expect("Failed to verify");
    assert!(report.passed(), "{report}");
    assert!(report.mismatches.is_empty());
    assert_eq!(report.matched.len(), 5);

    let split = dir.path().join("ome");
    let config = GeneratorConfig::new().with_partition(true);
    let conversion = convert(&xsd, &split, &config).expect("Failed to convert");
    let last = conversion
        .written
        .last()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned());
    assert_eq!(last.as_deref(), Some("ome.index.yaml"));

    let report = verify(&xsd, &split, &VerifyOptions::default()).expect("Failed to verify");
    assert!(report.passed(), "{report}");
    assert_eq!(report.matched.len(), 5);
}

#[test]
fn test_unresolved_range_writes_nothing() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let xsd = write_xsd(&dir, "u.xsd", UNRESOLVED);
    let output = dir.path().join("u.yaml");

    let err = convert(&xsd, &output, &GeneratorConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Codegen(_)));
    assert_eq!(
        err.to_string(),
        "cannot resolve range '{urn:u}DetectorType' of field 'Type' in class 'Detector'"
    );
    assert!(!output.exists());
}

#[test]
fn test_model_dump() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let xsd = write_xsd(&dir, "ome.xsd", OME);
    let model = parse_schema_file(&xsd).expect("Failed to parse");

    let path = dir.path().join("model.json");
    xsdlink::write_model_json(&model, &path).expect("Failed to write");
    let json = fs::read_to_string(&path).expect("Failed to read");
    assert!(json.contains("\"Pixels\""));
    assert!(json.contains("\"UnitsLength\""));
}
