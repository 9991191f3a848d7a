use super::literal::{self, Scalar, Shape};
use super::HarnessTemplate;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug)]
pub(super) struct JavaHarness;

/// Compact serialiser appended to every program: arrays and collections
/// print as `[a,b,c]` with no whitespace, a top-level String prints raw.
const SERIALIZER: &str = r#"
final class JudgeOutput {
    private JudgeOutput() {}

    static String serialize(Object value) {
        if (value instanceof String) {
            return (String) value;
        }
        return nested(value);
    }

    private static String nested(Object value) {
        if (value == null) {
            return "null";
        }
        if (value instanceof String) {
            return "\"" + ((String) value).replace("\\", "\\\\").replace("\"", "\\\"") + "\"";
        }
        if (value instanceof Character) {
            return "\"" + value + "\"";
        }
        if (value instanceof Iterable) {
            StringBuilder out = new StringBuilder("[");
            boolean first = true;
            for (Object item : (Iterable<?>) value) {
                if (!first) {
                    out.append(',');
                }
                out.append(nested(item));
                first = false;
            }
            return out.append(']').toString();
        }
        if (value.getClass().isArray()) {
            int length = java.lang.reflect.Array.getLength(value);
            StringBuilder out = new StringBuilder("[");
            for (int i = 0; i < length; i++) {
                if (i > 0) {
                    out.append(',');
                }
                out.append(nested(java.lang.reflect.Array.get(value, i)));
            }
            return out.append(']').toString();
        }
        return String.valueOf(value);
    }
}
"#;

/// `public class Solution` cannot live next to `public class Main`
fn demote_public_solution(user_source: &str) -> String {
    static PUBLIC_SOLUTION: OnceLock<Regex> = OnceLock::new();
    PUBLIC_SOLUTION
        .get_or_init(|| Regex::new(r"\bpublic\s+class\s+Solution\b").expect("static regex is valid"))
        .replace_all(user_source, "class Solution")
        .into_owned()
}

/// Split `import` lines off a bare-method source; they cannot live
/// inside the generated `Solution` class
fn hoist_imports(user_source: &str) -> (String, String) {
    let (imports, body): (Vec<&str>, Vec<&str>) = user_source
        .lines()
        .partition(|line| line.trim_start().starts_with("import "));
    (imports.join("\n"), body.join("\n"))
}

fn java_type(shape: &Shape) -> String {
    match shape {
        Shape::Unknown | Shape::Scalar(Scalar::Int) => "int".to_string(),
        Shape::Scalar(Scalar::Long) => "long".to_string(),
        Shape::Scalar(Scalar::Double) => "double".to_string(),
        Shape::Scalar(Scalar::Bool) => "boolean".to_string(),
        Shape::Scalar(Scalar::Str) => "String".to_string(),
        Shape::Mixed => "Object".to_string(),
        Shape::Array(inner) => format!("{}[]", java_type(inner)),
    }
}

/// Value text inside an initialiser whose element type is `shape`
fn java_value(value: &Value, shape: &Shape) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match shape {
            Shape::Scalar(Scalar::Long) => format!("{}L", n),
            Shape::Scalar(Scalar::Double) => literal::number_text(n, Scalar::Double),
            _ => n.to_string(),
        },
        Value::String(s) => literal::string_text(s),
        Value::Array(items) => {
            let inner = match shape {
                Shape::Array(inner) => inner.as_ref().clone(),
                _ => Shape::Mixed,
            };
            let elements: Vec<String> = items.iter().map(|item| java_value(item, &inner)).collect();
            format!("{{{}}}", elements.join(","))
        }
        Value::Object(_) => "null".to_string(),
    }
}

/// Top-level argument: arrays need an explicit `new T[]` in call position
fn java_argument(value: &Value) -> String {
    let shape = literal::shape_of(value);
    match (value, &shape) {
        (Value::Array(_), Shape::Array(_)) => {
            format!("new {}{}", java_type(&shape), java_value(value, &shape))
        }
        (Value::Array(_), _) => format!("new Object[]{}", java_value(value, &shape)),
        _ => java_value(value, &shape),
    }
}

impl HarnessTemplate for JavaHarness {
    fn frame(&self, entry_point: &str, user_source: &str, class_based: bool) -> (String, String) {
        let (imports, solution) = if class_based {
            (String::new(), demote_public_solution(user_source))
        } else {
            let (imports, body) = hoist_imports(user_source);
            (imports, format!("class Solution {{\n{}\n}}", body))
        };

        let mut prefix = String::from("import java.util.*;\nimport java.util.stream.*;\n");
        if !imports.is_empty() {
            prefix.push_str(&imports);
            prefix.push('\n');
        }
        prefix.push('\n');
        prefix.push_str(&solution);
        prefix.push_str(SERIALIZER);
        prefix.push_str(&format!(
            "\npublic class Main {{\n    \
             public static void main(String[] args) {{\n        \
             try {{\n            \
             Solution solution = new Solution();\n            \
             Object result = solution.{}(",
            entry_point
        ));

        let suffix = ");\n            \
             System.out.println(JudgeOutput.serialize(result));\n        \
             } catch (Throwable e) {\n            \
             System.err.println(e);\n            \
             System.exit(1);\n        \
             }\n    \
             }\n\
             }\n"
            .to_string();

        (prefix, suffix)
    }

    fn render_args(&self, raw_input: &str) -> String {
        match literal::parse_args(raw_input) {
            Ok(args) => args.iter().map(java_argument).collect::<Vec<_>>().join(", "),
            // Spliced as-is; a bad literal surfaces as a compile error verdict
            Err(_) => raw_input.trim().to_string(),
        }
    }
}
