//! IR → workshop rule text.
//!
//! Every variable lives in one global array; slot `N` is element `N` of it.
//! Output is deterministic: rules appear in event declaration order.

use tracing::debug;

use super::ast::BinOp;
use super::ir::{IrEvent, IrExpr, IrExprKind, IrStmt};

/// Assemble analyzed events into workshop text, using `array` as the name of
/// the global variable array.
pub fn assemble(events: &[IrEvent], array: &str) -> String {
    let mut asm = Assembler {
        array,
        out: String::new(),
        indent: 0,
    };
    asm.header();
    for event in events {
        asm.out.push('\n');
        asm.rule(event);
    }
    debug!(rules = events.len(), bytes = asm.out.len(), "assembled");
    asm.out
}

struct Assembler<'a> {
    array: &'a str,
    out: String,
    indent: usize,
}

impl Assembler<'_> {
    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn open(&mut self, text: &str) {
        self.line(text);
        self.indent += 1;
    }

    fn close(&mut self, text: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    fn header(&mut self) {
        self.open("variables {");
        self.open("global:");
        self.line(&format!("0: {}", self.array));
        self.indent = 0;
        self.line("}");
    }

    fn rule(&mut self, event: &IrEvent) {
        self.open(&format!("rule(\"{}\") {{", escape(&event.name)));
        self.open("event {");
        self.line(&format!("{};", event.trigger));
        self.line("All;");
        self.line("All;");
        self.close("}");
        self.open("actions {");
        self.stmts(&event.body);
        self.close("}");
        self.close("}");
    }

    // ── Statements ──────────────────────────────────────────────

    fn stmts(&mut self, stmts: &[IrStmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &IrStmt) {
        match stmt {
            IrStmt::Block(stmts) => self.stmts(stmts),
            IrStmt::If { condition, body } => {
                let condition = self.expr(condition);
                self.open(&format!("If({condition});"));
                self.stmts(body);
                self.close("End;");
            }
            IrStmt::While { condition, body } => {
                let condition = self.expr(condition);
                self.open(&format!("While({condition});"));
                self.stmts(body);
                self.close("End;");
            }
            IrStmt::Let { slot, value, .. } | IrStmt::Assign { slot, value } => {
                let value = self.expr(value);
                self.line(&format!(
                    "Set Global Variable At Index({}, {}, {value});",
                    self.array, slot.0
                ));
            }
            IrStmt::IndexAssign { object, field, value } => {
                let object = self.expr(object);
                let value = self.expr(value);
                self.line(&format!("Set Player Variable({object}, {field}, {value});"));
            }
            IrStmt::Call { name, args } => {
                let call = self.call(name, args);
                self.line(&format!("{call};"));
            }
            IrStmt::Break => self.line("Break;"),
            IrStmt::Continue => self.line("Continue;"),
            IrStmt::Noop => {}
        }
    }

    // ── Expressions ─────────────────────────────────────────────

    fn expr(&self, expr: &IrExpr) -> String {
        match &expr.kind {
            IrExprKind::Binary { op, lhs, rhs } => {
                let (l, r) = (self.expr(lhs), self.expr(rhs));
                match op {
                    BinOp::Add if expr.ty.is_native("string") => {
                        format!("Custom String(\"{{0}}{{1}}\", {l}, {r})")
                    }
                    BinOp::Add => format!("Add({l}, {r})"),
                    BinOp::Sub => format!("Subtract({l}, {r})"),
                    BinOp::Mul => format!("Multiply({l}, {r})"),
                    BinOp::Div => format!("Divide({l}, {r})"),
                    BinOp::And => format!("And({l}, {r})"),
                    BinOp::Or => format!("Or({l}, {r})"),
                    BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                        format!("Compare({l}, {}, {r})", op.symbol())
                    }
                }
            }
            IrExprKind::Not(operand) => format!("Not({})", self.expr(operand)),
            IrExprKind::Index { array, index } => {
                format!("Value In Array({}, {})", self.expr(array), self.expr(index))
            }
            IrExprKind::Call { name, args } => self.call(name, args),
            IrExprKind::Constant(text) => text.clone(),
            IrExprKind::Variable(slot) => format!("Value In Array(Global.{}, {})", self.array, slot.0),
            IrExprKind::Number(value) => number(*value),
            IrExprKind::String(value) => format!("Custom String(\"{}\")", escape(value)),
            IrExprKind::Template(value) => format!("\"{}\"", escape(value)),
            IrExprKind::Boolean(true) => "True".to_string(),
            IrExprKind::Boolean(false) => "False".to_string(),
            IrExprKind::Array(items) if items.is_empty() => "Empty Array".to_string(),
            IrExprKind::Array(items) => format!("Array({})", self.list(items)),
        }
    }

    fn call(&self, name: &str, args: &[IrExpr]) -> String {
        if args.is_empty() {
            return name.to_string();
        }
        format!("{name}({})", self.list(args))
    }

    fn list(&self, exprs: &[IrExpr]) -> String {
        exprs.iter().map(|e| self.expr(e)).collect::<Vec<_>>().join(", ")
    }
}

/// `-0` prints as `0`.
#[allow(clippy::float_cmp)]
fn number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::compiler::analyzer::analyze;
    use crate::compiler::ir::Slot;
    use crate::compiler::lexer::lex;
    use crate::compiler::optimize::optimize;
    use crate::compiler::parser::parse;
    use crate::compiler::types::Type;
    use crate::options::Options;

    fn compile(src: &str) -> String {
        let program = parse(lex(src).unwrap()).unwrap();
        let events = optimize(analyze(&program, &Options::default()).unwrap());
        assemble(&events, "Vars")
    }

    /// Action lines of the single rule in `src`, without indentation.
    fn actions(src: &str) -> Vec<String> {
        let text = compile(src);
        let start = text.find("actions {\n").unwrap() + "actions {\n".len();
        let end = text.rfind("\t}\n}").unwrap();
        text[start..end].lines().map(|l| l.trim().to_string()).collect()
    }

    #[test]
    fn header_and_rule_layout() {
        let text = compile("event server() { wait(1) }");
        assert_eq!(
            text,
            "variables {\n\
             \tglobal:\n\
             \t\t0: Vars\n\
             }\n\
             \n\
             rule(\"server\") {\n\
             \tevent {\n\
             \t\tOngoing - Global;\n\
             \t\tAll;\n\
             \t\tAll;\n\
             \t}\n\
             \tactions {\n\
             \t\tWait(1, Ignore Condition);\n\
             \t}\n\
             }\n"
        );
    }

    #[test]
    fn rules_follow_declaration_order() {
        let text = compile("event client(p) { }\nevent playerTookDamage(a, b, c, d, e, f) { }");
        let client = text.find("Ongoing - Each Player;").unwrap();
        let damage = text.find("Player Took Damage;").unwrap();
        assert!(client < damage);
    }

    #[test]
    fn variables_use_the_global_array() {
        assert_eq!(
            actions("event server() { let x = 1\nlet y = x * 2 }"),
            [
                "Set Global Variable At Index(Vars, 0, 1);",
                "Set Global Variable At Index(Vars, 1, Multiply(Value In Array(Global.Vars, 0), 2));",
            ]
        );
    }

    #[test]
    fn string_concatenation_uses_custom_string() {
        assert_eq!(
            actions("event server() { let a = \"x\"\nlet s = a + \"y\" }"),
            [
                "Set Global Variable At Index(Vars, 0, Custom String(\"x\"));",
                "Set Global Variable At Index(Vars, 1, Custom String(\"{0}{1}\", Value In Array(Global.Vars, 0), Custom String(\"y\")));",
            ]
        );
    }

    #[test]
    fn control_flow_blocks() {
        assert_eq!(
            actions("event server() { let n = 0\nwhile n < 3 { if n == 1 { break }\nn += 1 } }"),
            [
                "Set Global Variable At Index(Vars, 0, 0);",
                "While(Compare(Value In Array(Global.Vars, 0), <, 3));",
                "If(Compare(Value In Array(Global.Vars, 0), ==, 1));",
                "Break;",
                "End;",
                "Set Global Variable At Index(Vars, 0, Add(Value In Array(Global.Vars, 0), 1));",
                "End;",
            ]
        );
    }

    #[test]
    fn nested_blocks_are_indented() {
        let text = compile("event server() { if true { wait(1) } }");
        assert!(text.contains("\t\tIf(True);\n\t\t\tWait(1, Ignore Condition);\n\t\tEnd;\n"));
    }

    #[test]
    fn builtin_calls_and_constants() {
        assert_eq!(
            actions("event playerDied(v, a, d, c, ab, dir) { setInvisible(v, INVISIBLE_TO_ENEMIES)\nkill(allPlayers(TEAM_2), a) }"),
            [
                "Set Invisible(Victim, Enemies);",
                "Kill(All Players(Team 2), Attacker);",
            ]
        );
    }

    #[test]
    fn zero_argument_values_print_bare() {
        assert_eq!(
            actions("event server() { teleport(eventPlayer(), vector(0, 1.5, 0)) }"),
            ["Teleport(Event Player, Vector(0, 1.5, 0));"]
        );
    }

    #[test]
    fn index_assign_and_index() {
        assert_eq!(
            actions("event client(p) { let xs = [1, 2]\np.score = xs[1] }"),
            [
                "Set Global Variable At Index(Vars, 0, Array(1, 2));",
                "Set Player Variable(Event Player, score, Value In Array(Value In Array(Global.Vars, 0), 1));",
            ]
        );
    }

    #[test]
    fn format_template_is_bare_text() {
        assert_eq!(
            actions("event client(p) { smallMessage(p, format(\"{0} hp\", 5)) }"),
            ["Small Message(Event Player, Custom String(\"{0} hp\", 5));"]
        );
    }

    #[test]
    fn negative_zero_prints_as_zero() {
        assert_eq!(
            actions("event server() { let x = 0 * -1 }"),
            ["Set Global Variable At Index(Vars, 0, 0);"]
        );
    }

    #[test]
    fn literals() {
        let asm = Assembler {
            array: "Vars",
            out: String::new(),
            indent: 0,
        };
        assert_eq!(asm.expr(&IrExpr::boolean(false)), "False");
        assert_eq!(asm.expr(&IrExpr::number(-2.5)), "-2.5");
        assert_eq!(asm.expr(&IrExpr::number(-0.0)), "0");
        assert_eq!(asm.expr(&IrExpr::string("say \"hi\"")), "Custom String(\"say \\\"hi\\\"\")");
        assert_eq!(
            asm.expr(&IrExpr::new(Type::array(Type::number()), IrExprKind::Array(vec![]))),
            "Empty Array"
        );
        assert_eq!(
            asm.expr(&IrExpr::not(IrExpr::variable(Type::boolean(), Slot(4)))),
            "Not(Value In Array(Global.Vars, 4))"
        );
    }

    #[test]
    fn custom_array_name() {
        let program = parse(lex("event server() { let x = 1 }").unwrap()).unwrap();
        let events = analyze(&program, &Options::default()).unwrap();
        let text = assemble(&events, "Slots");
        assert!(text.contains("0: Slots"));
        assert!(text.contains("Set Global Variable At Index(Slots, 0, 1);"));
    }
}
