use super::HarnessTemplate;

#[derive(Debug)]
pub(super) struct PythonHarness;

const HEADER: &str = "import json\nimport sys\nfrom typing import *\n\n";

const SERIALIZER: &str = r#"

def _judge_serialize(value):
    if isinstance(value, str):
        return value
    return json.dumps(value, separators=(",", ":"), ensure_ascii=False)
"#;

impl HarnessTemplate for PythonHarness {
    fn frame(&self, entry_point: &str, user_source: &str, class_based: bool) -> (String, String) {
        let call = if class_based {
            format!("Solution().{}", entry_point)
        } else {
            entry_point.to_string()
        };

        let mut prefix = String::from(HEADER);
        prefix.push_str(user_source);
        prefix.push_str(SERIALIZER);
        // JSON spellings of the literals so shared inputs evaluate as Python
        prefix.push_str(
            "\n\nif __name__ == \"__main__\":\n    \
             true, false, null = True, False, None\n    \
             try:\n        _judge_args = ",
        );

        let suffix = format!(
            "\n        _judge_result = {call}(*_judge_args)\n        \
             sys.stdout.write(_judge_serialize(_judge_result) + \"\\n\")\n    \
             except Exception as exc:\n        \
             sys.stderr.write(f\"{{type(exc).__name__}}: {{exc}}\\n\")\n        \
             sys.exit(1)\n",
            call = call
        );

        (prefix, suffix)
    }

    fn render_args(&self, raw_input: &str) -> String {
        let literal = raw_input.trim();
        if literal.is_empty() {
            "()".to_string()
        } else {
            format!("({},)", literal)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::harness::generate;
    use arbiter_common::Language;

    #[test]
    fn test_bare_function_call() {
        let program = generate(
            Language::Python,
            "moveZeroes",
            "[0,1,0,3,12]",
            "def moveZeroes(nums):\n    return sorted(nums, key=lambda x: x == 0)",
        );
        assert!(program.contains("_judge_args = ([0,1,0,3,12],)"));
        assert!(program.contains("_judge_result = moveZeroes(*_judge_args)"));
        assert!(program.contains("separators=(\",\", \":\")"));
    }

    #[test]
    fn test_json_literals_have_python_aliases() {
        let program = generate(Language::Python, "f", "[true, null]", "def f(xs):\n    return xs");
        assert!(program.contains("true, false, null = True, False, None"));
        assert!(program.contains("_judge_args = ([true, null],)"));
    }

    #[test]
    fn test_class_based_call() {
        let source = "class Solution:\n    def add(self, a, b):\n        return a + b";
        let program = generate(Language::Python, "add", "1, 2", source);
        assert!(program.contains("_judge_args = (1, 2,)"));
        assert!(program.contains("Solution().add(*_judge_args)"));
    }

    #[test]
    fn test_exceptions_go_to_stderr() {
        let program = generate(Language::Python, "f", "1", "def f(x):\n    raise ValueError('boom')");
        assert!(program.contains("except Exception as exc:"));
        assert!(program.contains("sys.stderr.write"));
        assert!(program.contains("sys.exit(1)"));
    }

    #[test]
    fn test_nested_strings_printed_as_utf8() {
        let program = generate(
            Language::Python,
            "reverse",
            "[\"é\", \"b\"]",
            "def reverse(xs):\n    return xs[::-1]",
        );
        assert!(program.contains("ensure_ascii=False"));

        let Some(stdout) = crate::testing::run_locally("main.py", &program, None, &["python3", "main.py"])
        else {
            return;
        };
        assert_eq!(stdout, "[\"b\",\"é\"]\n");
    }

    #[test]
    fn test_empty_input_calls_without_arguments() {
        let program = generate(Language::Python, "f", "", "def f():\n    return 1");
        assert!(program.contains("_judge_args = ()\n"));
    }
}
