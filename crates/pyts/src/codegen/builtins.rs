use crate::ast::Expr;
use crate::PytsError;

use super::Generator;

impl Generator {
    pub(super) fn call(&mut self, callee: &Expr, args: &[Expr]) -> Result<String, PytsError> {
        match callee {
            Expr::Identifier(name) => match self.builtin_call(&name.name, args)? {
                Some(code) => Ok(code),
                None => Ok(format!("{}({})", name.name, self.exprs(args)?.join(", "))),
            },
            Expr::Attribute { object, name, .. } => self.method_call(object, &name.name, args),
            other => {
                let callee = self.operand(other)?;
                Ok(format!("{callee}({})", self.exprs(args)?.join(", ")))
            }
        }
    }

    /// `None` when `name` with this many arguments has no TypeScript counterpart
    /// and should be called as written.
    fn builtin_call(&mut self, name: &str, args: &[Expr]) -> Result<Option<String>, PytsError> {
        let code = match (name, args) {
            ("print", _) => format!("console.log({})", self.exprs(args)?.join(", ")),
            ("len", [value]) => format!("{}.length", self.receiver(value)?),
            ("str", [value]) => format!("String({})", self.expr(value)?),
            ("int", [value]) => format!("parseInt({})", self.expr(value)?),
            ("int", [value, base]) => {
                format!("parseInt({}, {})", self.expr(value)?, self.expr(base)?)
            }
            ("float", [value]) => format!("parseFloat({})", self.expr(value)?),
            ("bool", [value]) => format!("Boolean({})", self.expr(value)?),
            ("input", []) => "prompt()".to_string(),
            ("input", [message]) => format!("prompt({})", self.expr(message)?),
            ("abs", [value]) => format!("Math.abs({})", self.expr(value)?),
            ("round", [value]) => format!("Math.round({})", self.expr(value)?),
            ("round", [value, digits]) => format!(
                "Number({}.toFixed({}))",
                self.receiver(value)?,
                self.expr(digits)?
            ),
            ("sum", [values]) => format!("{}.reduce((a, b) => a + b, 0)", self.receiver(values)?),
            ("max" | "min", [values]) => format!("Math.{name}(...{})", self.operand(values)?),
            ("max" | "min", [_, _, ..]) => {
                format!("Math.{name}({})", self.exprs(args)?.join(", "))
            }
            ("list", []) => "[]".to_string(),
            ("list", [values]) => format!("Array.from({})", self.expr(values)?),
            ("range", [stop]) => {
                format!("Array.from({{ length: {} }}, (_, i) => i)", self.expr(stop)?)
            }
            ("range", [start, stop]) => {
                let (start, stop) = (self.operand(start)?, self.operand(stop)?);
                format!("Array.from({{ length: Math.max(0, {stop} - {start}) }}, (_, i) => {start} + i)")
            }
            ("range", [start, stop, step]) => {
                let (start, stop, step) =
                    (self.operand(start)?, self.operand(stop)?, self.operand(step)?);
                format!(
                    "Array.from({{ length: Math.max(0, Math.ceil(({stop} - {start}) / {step})) }}, (_, i) => {start} + i * {step})"
                )
            }
            _ => return Ok(None),
        };
        Ok(Some(code))
    }

    fn method_call(
        &mut self,
        object: &Expr,
        method: &str,
        args: &[Expr],
    ) -> Result<String, PytsError> {
        if let ("join", [values]) = (method, args) {
            let separator = self.expr(object)?;
            return Ok(format!("{}.join({separator})", self.receiver(values)?));
        }
        let receiver = self.receiver(object)?;
        Ok(match (method, args) {
            ("append", [value]) => format!("{receiver}.push({})", self.expr(value)?),
            ("extend", [values]) => format!("{receiver}.push(...{})", self.operand(values)?),
            ("insert", [index, value]) => format!(
                "{receiver}.splice({}, 0, {})",
                self.expr(index)?,
                self.expr(value)?
            ),
            ("upper", []) => format!("{receiver}.toUpperCase()"),
            ("lower", []) => format!("{receiver}.toLowerCase()"),
            ("strip", []) => format!("{receiver}.trim()"),
            ("lstrip", []) => format!("{receiver}.trimStart()"),
            ("rstrip", []) => format!("{receiver}.trimEnd()"),
            ("startswith", [prefix]) => format!("{receiver}.startsWith({})", self.expr(prefix)?),
            ("endswith", [suffix]) => format!("{receiver}.endsWith({})", self.expr(suffix)?),
            ("split", []) => format!("{receiver}.trim().split(/\\s+/)"),
            ("replace", [from, to]) => format!(
                "{receiver}.replaceAll({}, {})",
                self.expr(from)?,
                self.expr(to)?
            ),
            ("find", [needle]) => format!("{receiver}.indexOf({})", self.expr(needle)?),
            _ => format!("{receiver}.{method}({})", self.exprs(args)?.join(", ")),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::generate;
    use crate::config::CompileOptions;
    use crate::parser::parse;

    fn line(source: &str) -> String {
        let (program, diags) = parse(source);
        assert!(
            diags.iter().all(|d| !d.is_error()),
            "unexpected diagnostics: {diags:#?}"
        );
        let out = generate(&program, &CompileOptions::default()).expect("generate");
        out.lines().last().unwrap_or_default().to_string()
    }

    #[test]
    fn builtin_functions() {
        assert_eq!(line("xs = [1, 2]\nprint(len(xs), sum(xs))\n"), "console.log(xs.length, xs.reduce((a, b) => a + b, 0));");
        assert_eq!(line("n = int(input(\"n: \"))\n"), "let n: any = parseInt(prompt(\"n: \"));");
        assert_eq!(line("print(str(1), float(\"2\"), bool(0))\n"), "console.log(String(1), parseFloat(\"2\"), Boolean(0));");
        assert_eq!(line("print(round(2.345, 2))\n"), "console.log(Number((2.345).toFixed(2)));");
        assert_eq!(line("print(abs(-2), round(2.5))\n"), "console.log(Math.abs(-2), Math.round(2.5));");
        assert_eq!(line("xs = [3]\nprint(max(xs), min(1, 2))\n"), "console.log(Math.max(...xs), Math.min(1, 2));");
        assert_eq!(line("print(len(\"a\" + \"b\"))\n"), "console.log((\"a\" + \"b\").length);");
    }

    #[test]
    fn integer_receivers_are_parenthesized() {
        assert_eq!(line("print(round(5, 2))\n"), "console.log(Number((5).toFixed(2)));");
        assert_eq!(line("x = 3\nprint(round(x, 1))\n"), "console.log(Number(x.toFixed(1)));");
    }

    #[test]
    fn range_outside_a_loop() {
        assert_eq!(
            line("r = range(4)\n"),
            "let r: any = Array.from({ length: 4 }, (_, i) => i);"
        );
        assert_eq!(
            line("r = list(range(1, 3))\n"),
            "let r: any = Array.from(Array.from({ length: Math.max(0, 3 - 1) }, (_, i) => 1 + i));"
        );
    }

    #[test]
    fn methods() {
        assert_eq!(line("xs = []\nxs.append(1)\n"), "xs.push(1);");
        assert_eq!(line("s = \"a\"\nprint(s.upper(), s.strip().lower())\n"), "console.log(s.toUpperCase(), s.trim().toLowerCase());");
        assert_eq!(line("xs = [\"a\"]\nprint(\", \".join(xs))\n"), "console.log(xs.join(\", \"));");
        assert_eq!(line("s = \"a b\"\nprint(s.split(), s.startswith(\"a\"))\n"), "console.log(s.trim().split(/\\s+/), s.startsWith(\"a\"));");
        assert_eq!(line("s = \"a\"\nprint(s.replace(\"a\", \"b\"))\n"), "console.log(s.replaceAll(\"a\", \"b\"));");
        assert_eq!(line("s = \"a\"\nprint(s.title())\n"), "console.log(s.title());");
    }
}
