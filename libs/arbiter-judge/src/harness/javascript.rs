use super::HarnessTemplate;

#[derive(Debug)]
pub(super) struct JavaScriptHarness;

const SERIALIZER: &str = r#"

function __judgeSerialize(value) {
  if (typeof value === "string") return value;
  if (value === undefined) return "null";
  return JSON.stringify(value);
}
"#;

impl HarnessTemplate for JavaScriptHarness {
    fn frame(&self, entry_point: &str, user_source: &str, class_based: bool) -> (String, String) {
        let call = if class_based {
            format!("new Solution().{}", entry_point)
        } else {
            entry_point.to_string()
        };

        let mut prefix = String::from("\"use strict\";\n\n");
        prefix.push_str(user_source);
        prefix.push_str(SERIALIZER);
        prefix.push_str("\ntry {\n  const __judgeArgs = ");

        let suffix = format!(
            ";\n  const __judgeResult = {call}(...__judgeArgs);\n  \
             process.stdout.write(__judgeSerialize(__judgeResult) + \"\\n\");\n\
             }} catch (err) {{\n  \
             process.stderr.write(String(err && err.message ? err.message : err) + \"\\n\");\n  \
             process.exitCode = 1;\n\
             }}\n",
            call = call
        );

        (prefix, suffix)
    }

    fn render_args(&self, raw_input: &str) -> String {
        format!("[{}]", raw_input.trim())
    }
}
