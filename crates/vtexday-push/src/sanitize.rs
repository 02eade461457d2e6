//! Notification text sanitizing
//!
//! Titles and bodies end up on lock screens, so markup is reduced to plain
//! text before anything is delivered or recorded.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::prelude::*;

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_BODY_CHARS: usize = 1000;

/// Elements removed together with their content
const STRIPPED_ELEMENTS: &[&str] = &["script", "style", "iframe", "object", "embed", "noscript"];

/// Stripping stops after this many passes even if the text still changes
const MAX_PASSES: usize = 16;

struct Patterns {
	/// Per element: the element with its content, then unclosed leftovers
	elements: Vec<(Regex, Regex)>,
	any_tag: Regex,
	/// `<` that would start a tag once rendered
	tag_start: Regex,
}

impl Patterns {
	fn compile() -> Result<Self, regex::Error> {
		let elements = STRIPPED_ELEMENTS
			.iter()
			.map(|element| {
				Ok((
					Regex::new(&format!(r"(?is)<{}\b[^>]*>.*?</{}\s*>", element, element))?,
					Regex::new(&format!(r"(?i)<{}\b[^>]*>", element))?,
				))
			})
			.collect::<Result<Vec<_>, regex::Error>>()?;

		Ok(Self {
			elements,
			any_tag: Regex::new(r"(?s)</?[a-zA-Z!?][^>]*>")?,
			tag_start: Regex::new(r"<([/!?]?[a-zA-Z!?])")?,
		})
	}

	/// One stripping pass over `input`
	fn strip(&self, input: &str) -> String {
		let mut result = input.to_string();
		for (with_content, open_tag) in &self.elements {
			result = with_content.replace_all(&result, "").into_owned();
			result = open_tag.replace_all(&result, "").into_owned();
		}
		self.any_tag.replace_all(&result, "").into_owned()
	}
}

static PATTERNS: LazyLock<Result<Patterns, regex::Error>> = LazyLock::new(Patterns::compile);

/// Reduce `input` to plain text: drop dangerous elements with their content,
/// drop all remaining tags, remove control characters and trim.
///
/// Stripping repeats until the text is stable, so markup nested inside a tag
/// cannot reassemble into a new tag. A `<` still able to open a tag after
/// that is removed.
pub fn sanitize_text(input: &str) -> ClResult<String> {
	let patterns =
		PATTERNS.as_ref().map_err(|e| Error::Internal(format!("regex error: {}", e)))?;

	let mut result = input.to_string();
	for _ in 0..MAX_PASSES {
		let stripped = patterns.strip(&result);
		if stripped == result {
			break;
		}
		result = stripped;
	}

	// Removing a stray `<` can expose another one
	while patterns.tag_start.is_match(&result) {
		result = patterns.tag_start.replace_all(&result, "$1").into_owned();
	}

	let cleaned: String =
		result.chars().filter(|c| !c.is_control() || *c == '\n' || *c == '\t').collect();
	Ok(cleaned.trim().to_string())
}

/// Sanitized, validated notification ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationContent {
	pub title: String,
	pub body: String,
	pub data: Option<Value>,
}

impl NotificationContent {
	pub fn new(title: &str, body: &str, data: Option<Value>) -> ClResult<Self> {
		let title = sanitize_text(title)?;
		let body = sanitize_text(body)?;

		check_length("title", &title, MAX_TITLE_CHARS)?;
		check_length("body", &body, MAX_BODY_CHARS)?;

		let data = match data {
			None | Some(Value::Null) => None,
			Some(Value::Object(map)) => Some(Value::Object(map)),
			Some(_) => return Err(Error::ValidationError("data must be a JSON object".into())),
		};

		Ok(Self { title, body, data })
	}
}

fn check_length(field: &str, value: &str, max: usize) -> ClResult<()> {
	let len = value.chars().count();
	if len == 0 {
		return Err(Error::ValidationError(format!("{} must not be empty", field)));
	}
	if len > max {
		return Err(Error::ValidationError(format!(
			"{} must be at most {} characters",
			field, max
		)));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_strips_markup() {
		assert_eq!(sanitize_text("<b>Keynote</b> starts <i>now</i>").unwrap(), "Keynote starts now");
		assert_eq!(
			sanitize_text("Hi<script>alert('x')</script> there").unwrap(),
			"Hi there"
		);
		assert_eq!(sanitize_text("<img src=x onerror=alert(1)>Hall B").unwrap(), "Hall B");
		assert_eq!(sanitize_text("  plain  ").unwrap(), "plain");
	}

	#[test]
	fn test_nested_markup_does_not_reassemble() {
		assert_eq!(sanitize_text("<<b>b>Hi<</b>/b>").unwrap(), "Hi");
		assert_eq!(sanitize_text("<<img>img src=x onerror=alert(1)>Hi").unwrap(), "Hi");
		assert_eq!(
			sanitize_text("<scr<script>x</script>ipt>alert(1)</script>ok").unwrap(),
			"alert(1)ok"
		);
		assert_eq!(sanitize_text("<<<<img>>>>").unwrap(), "<<<>>>");
		assert_eq!(sanitize_text("a <<b>/b> c").unwrap(), "a  c");
		assert_eq!(sanitize_text("<<<a").unwrap(), "a");
	}

	#[test]
	fn test_stray_tag_openers_removed() {
		assert_eq!(
			sanitize_text("<img src=x onerror=alert(1)").unwrap(),
			"img src=x onerror=alert(1)"
		);
		assert_eq!(sanitize_text("<!-- note").unwrap(), "!-- note");
	}

	#[test]
	fn test_keeps_comparisons() {
		assert_eq!(sanitize_text("1 < 2 and 3 > 2").unwrap(), "1 < 2 and 3 > 2");
	}

	#[test]
	fn test_keeps_newlines() {
		assert_eq!(sanitize_text("line one\nline two\u{7}").unwrap(), "line one\nline two");
	}

	#[test]
	fn test_content_validation() {
		let content = NotificationContent::new("Welcome", "<p>Doors open</p>", None).unwrap();
		assert_eq!(content.body, "Doors open");

		assert!(matches!(
			NotificationContent::new("<br>", "body", None),
			Err(Error::ValidationError(_))
		));
		assert!(matches!(
			NotificationContent::new(&"a".repeat(101), "body", None),
			Err(Error::ValidationError(_))
		));
		let nested =
			NotificationContent::new("<<img>img src=x onerror=alert(1)>Hi", "b", None).unwrap();
		assert_eq!(nested.title, "Hi");
		assert!(NotificationContent::new(&"é".repeat(100), "body", None).is_ok());
		assert!(matches!(
			NotificationContent::new("title", &"b".repeat(1001), None),
			Err(Error::ValidationError(_))
		));
	}

	#[test]
	fn test_data_must_be_object() {
		let content =
			NotificationContent::new("t", "b", Some(json!({ "screen": "agenda" }))).unwrap();
		assert_eq!(content.data, Some(json!({ "screen": "agenda" })));

		assert!(NotificationContent::new("t", "b", Some(Value::Null)).unwrap().data.is_none());
		assert!(matches!(
			NotificationContent::new("t", "b", Some(json!([1, 2]))),
			Err(Error::ValidationError(_))
		));
	}
}

// vim: ts=4
