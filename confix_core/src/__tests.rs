use std::collections::HashMap;

use rstest::rstest;
use similar_asserts::assert_eq;
use tracing_test::traced_test;

use super::__fixtures::*;
use super::*;
use crate::formats::XmlHandler;
use crate::lexer::scan_expressions;
use crate::lexer::tokenize;
use crate::tokens::Token;
use crate::tree::Hierarchy;
use crate::tree::HierarchicalEntry;
use crate::tree::NodeKind;
use crate::tree::Segment;
use crate::tree::TreeDocument;
use crate::tree::TreeNode;
use crate::tree::linearize;
use crate::tree::resolve;

#[rstest]
#[case::plain_variable("${X}", Scalar::from("123"))]
#[case::md5("${X|md5}", Scalar::from("202cb962ac59075b964b07152d234b70"))]
#[case::md5_longer("${LONG|md5}", Scalar::from("739c50cce04bb3f39181b05f0939c9d3"))]
#[case::md5_of_missing("${MISSING|md5}", Scalar::from("d41d8cd98f00b204e9800998ecf8427e"))]
#[case::upper_then_trimleft("${SPACED|upper|trimleft}", Scalar::from("A BC "))]
#[case::trimright("${SPACED|trimright}", Scalar::from(" a bc"))]
#[case::trim("${SPACED|trim}", Scalar::from("a bc"))]
#[case::lower("${ABC|upper|lower}", Scalar::from("abc"))]
#[case::typed_int("${X|to_int}", Scalar::Int(123))]
#[case::typed_multiply("${X|to_int|multiply(m=2)}", Scalar::Int(246))]
#[case::multiply_default("${X|to_int|multiply}", Scalar::Int(123))]
#[case::multiply_quoted(r#"${X|to_int|multiply(m="3")}"#, Scalar::Int(369))]
#[case::multiply_empty_params("${X|to_int|multiply()}", Scalar::Int(123))]
#[case::spaces_both_sides("${X | md5}", Scalar::from("202cb962ac59075b964b07152d234b70"))]
#[case::space_before_pipe("${X |md5}", Scalar::from("202cb962ac59075b964b07152d234b70"))]
#[case::space_after_pipe("${X| md5}", Scalar::from("202cb962ac59075b964b07152d234b70"))]
#[case::missing_variable("${MISSING}", Scalar::from(""))]
#[case::unknown_filter("${ABC|doesnotexist}", Scalar::from("abc"))]
#[case::unknown_filter_with_params("${ABC|doesnotexist(a=b)|upper}", Scalar::from("ABC"))]
#[case::no_expression("plain text", Scalar::from("plain text"))]
#[case::lone_dollar("costs $5 {maybe}", Scalar::from("costs $5 {maybe}"))]
#[case::separated("${TEST1} - ${TEST2} / ${TEST3}", Scalar::from("http://url.tld - path / something"))]
#[case::query(
	"${TEST1}/${TEST2}?param1=value&param2=${TEST3}",
	Scalar::from("http://url.tld/path?param1=value&param2=something")
)]
#[case::adjacent("${TEST1}${TEST2}${TEST3}", Scalar::from("http://url.tldpathsomething"))]
#[case::prefixed("xx${TEST1}", Scalar::from("xxhttp://url.tld"))]
#[case::typed_inside_text("port=${X|to_int}", Scalar::from("port=123"))]
#[case::typed_and_hashed("${X|to_int|multiply} ${ABC|md5}", Scalar::from("123 900150983cd24fb0d6963f7d28e17f72"))]
fn render_values(#[case] input: &str, #[case] expected: Scalar) -> ConfixResult<()> {
	let result = engine().render(input)?;
	assert_eq!(result, expected);

	Ok(())
}

#[test]
fn splices_results_of_different_lengths() -> ConfixResult<()> {
	let engine = engine_with(&[("SHORT", "a"), ("WIDE", "abcdefghijklmnop")]);
	let result = engine.render("[${WIDE}] [${SHORT}] [${WIDE|upper}] [${MISSING}]")?;
	assert_eq!(
		result,
		Scalar::from("[abcdefghijklmnop] [a] [ABCDEFGHIJKLMNOP] []")
	);

	Ok(())
}

#[rstest]
#[case::unterminated("${X")]
#[case::unterminated_after_valid("${X} and ${Y")]
#[case::empty_body("${}")]
#[case::blank_body("${   }")]
#[case::missing_filter_name("${X|}")]
#[case::missing_filter_name_between("${X||upper}")]
#[case::unclosed_params("${X|multiply(m=2}")]
#[case::missing_equals("${X|multiply(m)}")]
#[case::missing_value("${X|multiply(m=)}")]
#[case::two_sources("${A B}")]
#[case::unterminated_quote(r#"${X|multiply(m="2)}"#)]
fn reject_malformed_expressions(#[case] input: &str) {
	let result = engine().render(input);
	assert!(
		matches!(result, Err(ConfixError::Parse { .. })),
		"expected a parse error for `{input}`, got {result:?}"
	);
}

#[rstest]
#[case::to_int_of_text("${ABC|to_int}")]
#[case::multiply_of_text("${ABC|multiply(m=2)}")]
#[case::multiply_bad_param("${X|to_int|multiply(m=two)}")]
#[case::multiply_overflow("${X|to_int|multiply(m=9223372036854775807)}")]
#[case::bcrypt_too_long("${LONG_SECRET|bcrypt}")]
fn filter_failures_abort_the_value(#[case] input: &str) {
	let secret = "x".repeat(73);
	let engine = engine_with(&[("LONG_SECRET", secret.as_str())]);
	let result = engine.render(&format!("prefix {input} suffix"));
	assert!(
		matches!(result, Err(ConfixError::FilterExecution { .. })),
		"expected a filter error for `{input}`, got {result:?}"
	);
}

#[test]
fn bcrypt_hashes_verify() -> AnyEmptyResult {
	let hashed = engine().render("${ABC|bcrypt}")?.into_string();
	assert!(hashed.starts_with("$2"));
	assert!(bcrypt::verify("abc", &hashed)?);

	Ok(())
}

#[test]
fn parse_template_records_spans_and_params() -> ConfixResult<()> {
	let expressions = parse_template("a ${X|multiply(m=2, n='a b')} b ${Y}")?;
	assert_eq!(
		expressions,
		vec![
			Expression {
				source: "X".to_string(),
				filters: vec![
					FilterCall::new("multiply")
						.with_param("m", "2")
						.with_param("n", "a b")
				],
				span: 2..29,
			},
			Expression {
				source: "Y".to_string(),
				filters: vec![],
				span: 32..36,
			},
		]
	);

	Ok(())
}

#[test]
fn parse_template_unescapes_quoted_params() -> ConfixResult<()> {
	let expressions = parse_template(r#"${X|prefix(with="a \"b\"", sep=',')}"#)?;
	assert_eq!(
		expressions[0].filters,
		vec![
			FilterCall::new("prefix")
				.with_param("with", "a \"b\"")
				.with_param("sep", ",")
		]
	);

	Ok(())
}

#[test]
fn expressions_do_not_nest() -> ConfixResult<()> {
	let spans = scan_expressions("${a${b}}")?;
	assert_eq!(spans.len(), 1);
	assert_eq!(spans[0].outer, 0..7);
	assert_eq!(spans[0].body, 2..6);

	Ok(())
}

#[test]
fn tokenize_expression_body() -> ConfixResult<()> {
	let tokens: Vec<Token> = tokenize("X | f(k='v')")?
		.into_iter()
		.map(|spanned| spanned.token)
		.collect();
	assert_eq!(
		tokens,
		vec![
			Token::Word("X".to_string()),
			Token::Whitespace(b' '),
			Token::Pipe,
			Token::Whitespace(b' '),
			Token::Word("f".to_string()),
			Token::ParenOpen,
			Token::Word("k".to_string()),
			Token::Equals,
			Token::String("v".to_string(), b'\''),
			Token::ParenClose,
		]
	);

	Ok(())
}

#[test]
fn file_reference_reads_existing_files() -> AnyEmptyResult {
	let dir = tempfile::tempdir()?;
	let secret = dir.path().join("secret.txt");
	std::fs::write(&secret, "s3cr3t")?;

	let reference = format!("@{}", secret.display());
	let engine = engine_with(&[
		("SECRET", reference.as_str()),
		("MISSING_FILE", "@/definitely/not/here"),
	]);

	assert_eq!(engine.render("${SECRET}")?, Scalar::from("s3cr3t"));
	assert_eq!(engine.render("${SECRET|upper}")?, Scalar::from("S3CR3T"));
	assert_eq!(
		engine.render("${MISSING_FILE}")?,
		Scalar::from("@/definitely/not/here")
	);

	Ok(())
}

#[test]
fn params_do_not_leak_between_expressions() -> ConfixResult<()> {
	let mut registry = FilterRegistry::with_builtins();
	registry.register("prefix", prefix_factory());
	let engine = TemplateEngine::new(registry).with_variables(variables());

	let result = engine.render("${ABC|prefix(with=1-)} ${ABC|prefix}")?;
	assert_eq!(result, Scalar::from("1-abc abc"));

	Ok(())
}

#[test]
#[traced_test]
fn plugin_rejections_are_logged_and_skipped() -> ConfixResult<()> {
	let mut registry = FilterRegistry::with_builtins();
	let rejected = registry.load_plugins([&SamplePlugin as &dyn FilterPlugin, &PrefixPlugin]);

	assert_eq!(rejected.len(), 3);
	assert!(
		rejected
			.iter()
			.all(|error| matches!(error, ConfixError::Plugin { plugin, .. } if plugin == "sample"))
	);
	assert!(registry.contains("reverse"));
	assert!(registry.contains("prefix"));
	assert!(logs_contain("rejected filter `upper` from plugin `sample`"));

	let engine = TemplateEngine::new(registry).with_variables(variables());
	assert_eq!(engine.render("${ABC|upper}")?, Scalar::from("ABC"));
	assert_eq!(engine.render("${ABC|reverse}")?, Scalar::from("cba"));
	assert_eq!(
		engine.render("${ABC|prefix(with=x)|reverse}")?,
		Scalar::from("cbax")
	);

	Ok(())
}

#[rstest]
#[case::int(Scalar::Int(1), "42", Some(Scalar::Int(42)))]
#[case::int_invalid(Scalar::Int(1), "4.2", None)]
#[case::float(Scalar::Float(1.0), "2.5", Some(Scalar::Float(2.5)))]
#[case::bool_short(Scalar::Bool(false), "T", Some(Scalar::Bool(true)))]
#[case::bool_numeric(Scalar::Bool(true), "0", Some(Scalar::Bool(false)))]
#[case::bool_invalid(Scalar::Bool(true), "yes", None)]
#[case::string(Scalar::from("a"), "anything", Some(Scalar::from("anything")))]
fn convert_scalars(#[case] original: Scalar, #[case] text: &str, #[case] expected: Option<Scalar>) {
	let converted = original.convert(text, "path").ok();
	assert_eq!(converted, expected);
}

#[test]
fn linearize_emits_keys_before_their_values() -> ConfixResult<()> {
	let root = serde_json::json!({ "a": { "b": [1, "x"] }, "c": true });
	let entries: Vec<(bool, String, String)> = linearize(&root)?
		.iter()
		.map(|entry| {
			(
				matches!(entry, HierarchicalEntry::Key(_)),
				entry.path(),
				entry.value(),
			)
		})
		.collect();

	assert_eq!(
		entries,
		vec![
			(true, "a".to_string(), "a".to_string()),
			(true, "a.b".to_string(), "b".to_string()),
			(false, "a.b.0".to_string(), "1".to_string()),
			(false, "a.b.1".to_string(), "x".to_string()),
			(true, "c".to_string(), "c".to_string()),
			(false, "c".to_string(), "true".to_string()),
		]
	);

	Ok(())
}

#[test]
fn hierarchies_resolve_to_their_source_nodes() -> ConfixResult<()> {
	let root = serde_json::json!({ "0": "zero", "list": ["first", { "deep": 2.5 }] });

	for entry in linearize(&root)? {
		if let HierarchicalEntry::Value(entry) = entry {
			let node = resolve(&root, &entry.hierarchy);
			assert!(node.is_some(), "`{}` does not resolve", entry.path());
			assert_eq!(
				node.map(TreeNode::kind),
				Some(NodeKind::Scalar(entry.original.clone()))
			);
		}
	}

	let map_key = Hierarchy::from(vec![Segment::Key("0".to_string())]);
	assert_eq!(resolve(&root, &map_key), Some(&serde_json::json!("zero")));

	let key_as_index = Hierarchy::from(vec![
		Segment::Key("list".to_string()),
		Segment::Key("0".to_string()),
	]);
	assert_eq!(resolve(&root, &key_as_index), None);

	let index = Hierarchy::from(vec![Segment::Key("list".to_string()), Segment::Index(0)]);
	assert_eq!(resolve(&root, &index), Some(&serde_json::json!("first")));

	Ok(())
}

#[rstest]
#[case::json_null(FileType::Json, r#"{"a": {"b": null}}"#, "a.b", "null")]
#[case::yaml_null(FileType::Yaml, "a:\n  b: ~\n", "a.b", "null")]
#[case::yaml_tagged(FileType::Yaml, "a: !custom value\n", "a", "tagged value")]
fn unsupported_values_fail_on_read(
	#[case] file_type: FileType,
	#[case] input: &str,
	#[case] expected_path: &str,
	#[case] expected_type: &str,
) {
	let result = process_str(file_type, input, &engine());
	match result {
		Err(ConfixError::UnsupportedType { path, type_name }) => {
			assert_eq!(path, expected_path);
			assert!(
				type_name.starts_with(expected_type),
				"unexpected type name `{type_name}`"
			);
		}
		other => panic!("expected an unsupported type error, got {other:?}"),
	}
}

#[test]
fn edited_values_keep_their_type() -> ConfixResult<()> {
	let mut document = TreeDocument::new(serde_json::json!({ "port": 1, "ratio": 0.5 }))?;
	for entry in document.entries_mut() {
		match entry.path().as_str() {
			"port" if entry.value() == "1" => entry.set_value("42".to_string()),
			"ratio" if entry.value() == "0.5" => entry.set_value("1.5".to_string()),
			_ => {}
		}
	}

	let root = document.apply()?;
	assert_eq!(root, &serde_json::json!({ "port": 42, "ratio": 1.5 }));

	Ok(())
}

#[test]
fn edited_values_that_lose_their_type_fail() -> ConfixResult<()> {
	let mut document = TreeDocument::new(serde_json::json!({ "port": 1 }))?;
	for entry in document.entries_mut() {
		if entry.value() == "1" {
			entry.set_value("not a number".to_string());
		}
	}

	let result = document.apply();
	assert!(matches!(result, Err(ConfixError::TypeConversion { .. })));

	Ok(())
}

#[test]
fn setting_the_same_value_is_not_an_edit() -> ConfixResult<()> {
	let mut document = TreeDocument::new(serde_json::json!({ "name": "same" }))?;
	for entry in document.entries_mut() {
		let value = entry.value();
		entry.set_value(value);
		assert!(!entry.is_edited());
	}

	let mut property = PropertyEntry::new("key", "value");
	property.set_value("value".to_string());
	assert!(!property.is_edited());
	property.set_value("other".to_string());
	assert!(property.is_edited());

	Ok(())
}

#[test]
fn json_documents_are_rendered() -> ConfixResult<()> {
	let output = process_str(FileType::Json, JSON_DOCUMENT, &engine())?;
	insta::assert_snapshot!(output, @r#"
	{
	  "name": "db.internal",
	  "port": 8080,
	  "replicas": "246",
	  "production": {
	    "url": "jdbc://db.internal:5432/app",
	    "enabled": true
	  },
	  "tags": [
	    "ABC",
	    "static"
	  ]
	}
	"#);

	Ok(())
}

#[test]
fn nested_keys_are_renamed_deepest_first() -> ConfixResult<()> {
	let input = r#"{"${OUTER}": {"${INNER}": {"${OUTER}": 1}, "keep": 2}, "last": 3}"#;
	let output = process_str(FileType::Json, input, &engine())?;
	let parsed: serde_json::Value = serde_json::from_str(&output).map_err(|e| {
		ConfixError::DocumentParse {
			format: "json".to_string(),
			reason: e.to_string(),
		}
	})?;

	assert_eq!(
		parsed,
		serde_json::json!({ "outer": { "inner": { "outer": 1 }, "keep": 2 }, "last": 3 })
	);
	let keys: Vec<&str> = parsed
		.as_object()
		.map(|map| map.keys().map(String::as_str).collect())
		.unwrap_or_default();
	assert_eq!(keys, vec!["outer", "last"]);

	Ok(())
}

#[test]
fn keys_rendering_empty_keep_their_name() -> ConfixResult<()> {
	let json = process_str(
		FileType::Json,
		r#"{"${MISSING}": {"a": 1}, "${OUTER}": 2}"#,
		&engine(),
	)?;
	let parsed: serde_json::Value = serde_json::from_str(&json).map_err(|e| {
		ConfixError::DocumentParse {
			format: "json".to_string(),
			reason: e.to_string(),
		}
	})?;
	assert_eq!(
		parsed,
		serde_json::json!({ "${MISSING}": { "a": 1 }, "outer": 2 })
	);

	let yaml = process_str(FileType::Yaml, "\"${MISSING}\": 1\nkept: 2\n", &engine())?;
	let parsed: serde_yaml_ng::Value = serde_yaml_ng::from_str(&yaml).map_err(|e| {
		ConfixError::DocumentParse {
			format: "yaml".to_string(),
			reason: e.to_string(),
		}
	})?;
	assert_eq!(parsed.get("${MISSING}"), Some(&serde_yaml_ng::Value::from(1)));
	assert_eq!(parsed.get(""), None);

	Ok(())
}

#[test]
fn yaml_documents_are_rendered() -> ConfixResult<()> {
	let output = process_str(FileType::Yaml, YAML_DOCUMENT, &engine())?;
	let parsed: serde_yaml_ng::Value = serde_yaml_ng::from_str(&output).map_err(|e| {
		ConfixError::DocumentParse {
			format: "yaml".to_string(),
			reason: e.to_string(),
		}
	})?;

	let expected: serde_yaml_ng::Value = serde_yaml_ng::from_str(
		r#"server:
  host: db.internal
  port: 8080
  debug: false
production:
  replicas: "123"
  ratio: 0.5
items:
  - ABC
  - plain
"#,
	)
	.map_err(|e| {
		ConfixError::DocumentParse {
			format: "yaml".to_string(),
			reason: e.to_string(),
		}
	})?;

	assert_eq!(parsed, expected);

	let keys: Vec<&str> = parsed
		.as_mapping()
		.map(|mapping| mapping.keys().filter_map(serde_yaml_ng::Value::as_str).collect())
		.unwrap_or_default();
	assert_eq!(keys, vec!["server", "production", "items"]);

	Ok(())
}

#[test]
fn xml_entries_follow_document_order() -> ConfixResult<()> {
	let engine = engine();
	let mut handler = XmlHandler::new(&engine);
	let entries = entry_paths(&mut handler, XML_DOCUMENT)?;

	assert_eq!(
		entries,
		vec![
			("/config@env".to_string(), "${ENVIRONMENT}".to_string()),
			("/config/database@host".to_string(), "${DB_HOST}".to_string()),
			("/config/database@port".to_string(), "${DB_PORT}".to_string()),
			("/config/database/name".to_string(), "${ABC|upper}".to_string()),
			(
				"/config/database/options".to_string(),
				r#"{"ratio": "0.75", "tags": ["a", "b"]}"#.to_string()
			),
			("/config/static".to_string(), "unchanged & kept".to_string()),
		]
	);

	Ok(())
}

#[test]
fn xml_documents_are_rendered() -> ConfixResult<()> {
	let output = process_str(FileType::Xml, XML_DOCUMENT, &engine())?;
	assert_eq!(
		output,
		r#"<?xml version="1.0" encoding="UTF-8"?>
<config env="production">
  <!-- database -->
  <database host="db.internal" port="5432">
    <name>ABC</name>
    <options><![CDATA[{"ratio": "0.75", "tags": ["a", "b"]}]]></options>
  </database>
  <static>unchanged &amp; kept</static>
  <empty/>
</config>
"#
	);

	Ok(())
}

#[test]
fn xml_element_entries_write_through() -> ConfixResult<()> {
	let engine = engine();
	let mut handler = XmlHandler::new(&engine);
	handler.read(&mut "<a><b>old</b></a>".as_bytes())?;

	for entry in handler.entries() {
		entry.set_value("x < y".to_string());
		assert!(entry.is_edited());
	}

	let root = handler.root().map(|root| root.borrow().children.len());
	assert_eq!(root, Some(1));

	let mut output = Vec::new();
	handler.write(&mut output)?;
	assert_eq!(String::from_utf8_lossy(&output), "<a><b>x &lt; y</b></a>");

	Ok(())
}

#[test]
fn xml_cdata_keeps_markup_verbatim() -> ConfixResult<()> {
	let input = r#"<page><script><![CDATA[if (a < b && c > d) { el.innerHTML = "<b>${ABC|upper}</b> &amp; more"; }]]></script><title>R&amp;D</title></page>"#;
	let output = process_str(FileType::Xml, input, &engine())?;

	assert_eq!(
		output,
		r#"<page><script><![CDATA[if (a < b && c > d) { el.innerHTML = "<b>ABC</b> &amp; more"; }]]></script><title>R&amp;D</title></page>"#
	);

	Ok(())
}

#[test]
fn xml_cdata_is_rendered_once_like_attributes() -> ConfixResult<()> {
	let engine = engine_with(&[("NESTED", "${X}"), ("STRAY", "x${y")]);
	let input = r"<r a='${NESTED}' b='${STRAY}'><c><![CDATA[${NESTED}]]></c><d><![CDATA[${STRAY}]]></d></r>";
	let output = process_str(FileType::Xml, input, &engine)?;

	assert_eq!(
		output,
		r#"<r a="${X}" b="x${y"><c><![CDATA[${X}]]></c><d><![CDATA[x${y]]></d></r>"#
	);

	let mut handler = XmlHandler::new(&engine);
	handler.read(&mut input.as_bytes())?;
	let rendered: Vec<(String, bool)> = handler
		.entries()
		.map(|entry| (entry.path(), entry.is_rendered()))
		.collect();
	assert_eq!(
		rendered,
		vec![
			("/r@a".to_string(), false),
			("/r@b".to_string(), false),
			("/r/c".to_string(), true),
			("/r/d".to_string(), true),
		]
	);

	Ok(())
}

#[test]
fn xml_cdata_closing_sequence_is_split() -> ConfixResult<()> {
	let engine = engine_with(&[("CLOSER", "a]]>b")]);
	let output = process_str(FileType::Xml, "<c><![CDATA[${CLOSER}]]></c>", &engine)?;

	assert_eq!(output, "<c><![CDATA[a]]]]><![CDATA[>b]]></c>");

	let mut handler = XmlHandler::new(&engine);
	let entries = entry_paths(&mut handler, &output)?;
	assert_eq!(entries, vec![("/c".to_string(), "a]]".to_string())]);

	Ok(())
}

#[test]
fn xml_without_root_fails() {
	let result = process_str(FileType::Xml, "<?xml version=\"1.0\"?>\n", &engine());
	assert!(matches!(result, Err(ConfixError::DocumentParse { .. })));
}

#[test]
fn properties_documents_are_rendered() -> ConfixResult<()> {
	let output = process_str(FileType::Properties, PROPERTIES_DOCUMENT, &engine())?;
	let lines: Vec<&str> = output.lines().filter(|line| !line.starts_with('#')).collect();

	assert_eq!(
		lines,
		vec![
			"db.host = db.internal",
			"db.port = 5432",
			"name = ABC",
			"plain = value",
		]
	);

	Ok(())
}

#[test]
fn properties_are_read_and_written_as_utf8() -> ConfixResult<()> {
	let engine = engine_with(&[("CITY_NAME", "café")]);
	let mut handler = handler_for(FileType::Properties, &engine);
	handler.read(&mut "name=${CITY_NAME}\ncity=Zürich\n".as_bytes())?;
	render_entries(handler.as_mut(), &engine)?;

	let mut output = Vec::new();
	handler.write(&mut output)?;

	assert_eq!(
		String::from_utf8(output).ok().as_deref(),
		Some("name = café\ncity = Zürich\n")
	);

	Ok(())
}

#[rstest]
#[case::json("settings.json", FileType::Json)]
#[case::yaml("settings.yaml", FileType::Yaml)]
#[case::yml("settings.YML", FileType::Yaml)]
#[case::xml("pom.xml", FileType::Xml)]
#[case::properties("app.properties", FileType::Properties)]
#[case::alias("app.conf", FileType::Properties)]
fn infer_file_types(#[case] path: &str, #[case] expected: FileType) -> ConfixResult<()> {
	let aliases = HashMap::from([("conf".to_string(), FileType::Properties)]);
	let processor = FileProcessor::with_extensions(path, None, &aliases)?;
	assert_eq!(processor.file_type(), expected);

	Ok(())
}

#[rstest]
#[case::unknown_extension("notes.txt")]
#[case::no_extension("Makefile")]
fn reject_unknown_file_types(#[case] path: &str) {
	let result = FileProcessor::new(path, None);
	assert!(matches!(result, Err(ConfixError::UnsupportedFileType(_))));
}

#[test]
fn explicit_file_type_wins_over_extension() -> ConfixResult<()> {
	let processor = FileProcessor::new("settings.txt", Some("yml".parse()?))?;
	assert_eq!(processor.file_type(), FileType::Yaml);

	Ok(())
}

#[test]
fn process_file_from_disk() -> AnyEmptyResult {
	let dir = tempfile::tempdir()?;
	let path = dir.path().join("app.properties");
	std::fs::write(&path, "greeting=${ABC|upper}\n")?;

	let rendered = FileProcessor::new(&path, None)?.render(&engine())?;
	assert!(String::from_utf8(rendered)?.contains("greeting = ABC"));

	Ok(())
}

#[test]
fn failed_runs_produce_no_output() -> AnyEmptyResult {
	let dir = tempfile::tempdir()?;
	let path = dir.path().join("app.json");
	std::fs::write(&path, r#"{"a": "${ABC}", "b": "${ABC|to_int}"}"#)?;

	let mut output = Vec::new();
	let result = FileProcessor::new(&path, None)?.process(&engine(), &mut output);
	assert!(matches!(result, Err(ConfixError::FilterExecution { .. })));
	assert!(output.is_empty());

	Ok(())
}

#[test]
fn output_targets_guard_existing_files() -> AnyEmptyResult {
	let dir = tempfile::tempdir()?;
	let path = dir.path().join("out.json");
	std::fs::write(&path, "old")?;

	let guarded = OutputTarget::from_arg(&path.display().to_string(), false);
	assert!(matches!(
		guarded.write_output(b"new"),
		Err(ConfixError::TargetExists(_))
	));
	assert_eq!(std::fs::read_to_string(&path)?, "old");

	let allowed = OutputTarget::from_arg(&path.display().to_string(), true);
	allowed.write_output(b"new")?;
	assert_eq!(std::fs::read_to_string(&path)?, "new");

	let fresh = OutputTarget::from_arg(&dir.path().join("fresh.json").display().to_string(), false);
	fresh.write_output(b"{}")?;

	assert_eq!(OutputTarget::from_arg("-", false), OutputTarget::Stdout);

	Ok(())
}

#[test]
fn load_config_from_candidates() -> AnyEmptyResult {
	let dir = tempfile::tempdir()?;
	assert_eq!(ConfixConfig::load(dir.path())?, None);

	std::fs::create_dir_all(dir.path().join(".config"))?;
	std::fs::write(
		dir.path().join(".config/confix.toml"),
		"log_level = \"debug\"\n\n[extensions]\n\".CONF\" = \"properties\"\njsonc = \"json\"\n",
	)?;

	let config = ConfixConfig::load(dir.path())?.ok_or("config should be discovered")?;
	assert_eq!(config.log_level.as_deref(), Some("debug"));
	assert_eq!(config.extensions.get("conf"), Some(&FileType::Properties));
	assert_eq!(config.extensions.get("jsonc"), Some(&FileType::Json));

	Ok(())
}

#[rstest]
#[case::bad_toml("log_level = ")]
#[case::bad_file_type("[extensions]\nconf = \"ini\"\n")]
fn reject_invalid_config(#[case] content: &str) {
	let result = ConfixConfig::parse(content);
	assert!(matches!(result, Err(ConfixError::ConfigParse(_))));
}
