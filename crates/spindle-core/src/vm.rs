//! The tree-walking virtual machine.
//!
//! Execution is tick-driven and cooperative: the host calls [`Vm::run`],
//! which executes commands in order until a suspension point, and feeds
//! player input back in with [`Vm::player_input`] between ticks. Suspension
//! points are the pause screen (text paging), the selection prompt, the end
//! of the program, and fatal errors.
//!
//! The six-line pager overlaps pages: the window slides by five lines, so
//! the last line of one page is the first line of the next. That is the
//! original device behaviour and callers depend on it.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::builtins;
use crate::error::RuntimeError;
use crate::expr::{BinaryOp, Expr, UnaryOp};
use crate::host::{Host, Selection};
use crate::story::{Command, Story, START_PASSAGE};
use crate::text::wrap_text;
use crate::value::Value;

/// Maximum call stack depth.
pub const CALL_STACK_LIMIT: usize = 10;

/// Lines shown per text page.
pub const PAGE_LINES: usize = 6;

/// Execution state of the VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    /// Executing commands on the next `run()` tick.
    Running,
    /// Text page shown, waiting for a keypress.
    ScreenPause,
    /// Selection list shown, waiting for a choice.
    WaitingForSelection,
    /// Program over. Nothing more will run.
    Stopped,
}

/// A return frame pushed by `<<call>>`.
struct Frame {
    passage: String,
    return_ip: usize,
}

/// The story virtual machine.
pub struct Vm {
    story: Story,
    current: String,
    ip: usize,
    state: VmState,
    variables: HashMap<String, Value>,
    stack: Vec<Frame>,
    buffer: String,
    selections: Vec<Selection>,
    pending_lines: Vec<String>,
    page_start: usize,
    line_max_len: usize,
    rng: StdRng,
}

impl Vm {
    /// Create a VM positioned at the start passage.
    pub fn new(story: Story, line_max_len: usize) -> Self {
        Self::with_rng(story, line_max_len, StdRng::from_entropy())
    }

    /// Create a VM with a deterministic RNG seed. Used by the CLI's
    /// `--seed` flag and by tests.
    pub fn with_seed(story: Story, line_max_len: usize, seed: u64) -> Self {
        Self::with_rng(story, line_max_len, StdRng::seed_from_u64(seed))
    }

    fn with_rng(story: Story, line_max_len: usize, rng: StdRng) -> Self {
        Self {
            story,
            current: START_PASSAGE.to_string(),
            ip: 0,
            state: VmState::Running,
            variables: HashMap::new(),
            stack: Vec::new(),
            buffer: String::new(),
            selections: Vec::new(),
            pending_lines: Vec::new(),
            page_start: 0,
            line_max_len,
            rng,
        }
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    /// Advance execution until the next suspension point.
    ///
    /// Does nothing unless the state is `Running`. Side effects reach the
    /// host in command order; a fatal error is always the last callback of
    /// the tick that raised it.
    pub fn run(&mut self, host: &mut dyn Host) {
        while self.state == VmState::Running {
            let command = match self.story.passage(&self.current) {
                Some(p) => p.commands.get(self.ip).cloned(),
                None => {
                    let target = self.current.clone();
                    self.fatal(host, RuntimeError::UnknownJumpTarget(target));
                    return;
                }
            };
            match command {
                Some(command) => {
                    if let Err(err) = self.execute(command, host) {
                        self.fatal(host, err);
                        return;
                    }
                }
                None => self.end_of_passage(host),
            }
        }
    }

    /// Dispatch a player input event.
    ///
    /// During `ScreenPause` any index pages onward or resumes execution.
    /// During `WaitingForSelection` an in-range index confirms that entry.
    /// Ignored while `Running` or `Stopped`.
    pub fn player_input(&mut self, index: usize, host: &mut dyn Host) {
        match self.state {
            VmState::ScreenPause => {
                if self.page_start + PAGE_LINES < self.pending_lines.len() {
                    self.page_start += PAGE_LINES - 1;
                    self.emit_page(host);
                } else {
                    self.pending_lines.clear();
                    self.page_start = 0;
                    self.state = VmState::Running;
                    self.run(host);
                }
            }
            VmState::WaitingForSelection => {
                let Some(selection) = self.selections.get(index) else {
                    return;
                };
                let target = selection.target.clone();
                if !self.story.contains(&target) {
                    self.fatal(host, RuntimeError::UnknownSelectionTarget(target));
                    return;
                }
                self.selections.clear();
                host.set_selections(&[]);
                self.current = target;
                self.ip = 0;
                self.state = VmState::Running;
                self.run(host);
            }
            VmState::Running | VmState::Stopped => {}
        }
    }

    // ── Command execution ──────────────────────────────────────────────

    fn execute(&mut self, command: Command, host: &mut dyn Host) -> Result<(), RuntimeError> {
        match command {
            Command::PrintText { text } => {
                self.buffer.push_str(&text);
                self.ip += 1;
            }
            Command::Pause => {
                self.ip += 1;
                if !self.buffer.is_empty() {
                    self.flush(host);
                }
            }
            Command::JumpToPassage { target } => {
                if !self.story.contains(&target) {
                    return Err(RuntimeError::UnknownJumpTarget(target));
                }
                self.current = target;
                self.ip = 0;
            }
            Command::CallPassage { target } => {
                if !self.story.contains(&target) {
                    return Err(RuntimeError::UnknownCallTarget(target));
                }
                if self.stack.len() >= CALL_STACK_LIMIT {
                    return Err(RuntimeError::CallStackOverflow(CALL_STACK_LIMIT));
                }
                self.stack.push(Frame {
                    passage: std::mem::replace(&mut self.current, target),
                    return_ip: self.ip + 1,
                });
                self.ip = 0;
            }
            Command::ReturnPassage => {
                let frame = self.stack.pop().ok_or(RuntimeError::ReturnWithoutCall)?;
                self.current = frame.passage;
                self.ip = frame.return_ip;
            }
            Command::SetMusic { name, track } => {
                let track = self.eval(&track)?.as_int();
                host.set_music(&name, track);
                self.ip += 1;
            }
            Command::SetImage { name } => {
                host.set_image(&name);
                self.ip += 1;
            }
            Command::AddSelection { text, target } => {
                self.selections.push(Selection { text, target });
                self.ip += 1;
            }
            Command::If { condition, skip_count } => {
                if self.eval(&condition)?.as_bool() {
                    self.ip += 1;
                } else {
                    self.ip += skip_count;
                }
            }
            Command::SetVariable { name, value } => {
                let value = self.eval(&value)?;
                self.variables.insert(name, value);
                self.ip += 1;
            }
            Command::PrintResult { value } => {
                let value = self.eval(&value)?;
                self.buffer.push_str(&value.as_string());
                self.ip += 1;
            }
        }
        Ok(())
    }

    /// End of the current passage: flush text, offer selections, or stop.
    ///
    /// Text of one page or less is shown together with pending selections
    /// in the same tick; longer text pages first and the selections are
    /// offered once paging drains.
    fn end_of_passage(&mut self, host: &mut dyn Host) {
        if !self.buffer.is_empty() {
            if !self.selections.is_empty() {
                let lines = wrap_text(&self.buffer, self.line_max_len);
                if lines.len() <= PAGE_LINES {
                    self.buffer.clear();
                    if !lines.is_empty() {
                        host.set_text(&lines.join("\n"));
                    }
                    self.offer_selections(host);
                } else {
                    self.flush(host);
                }
            } else {
                self.flush(host);
            }
        } else if !self.selections.is_empty() {
            self.offer_selections(host);
        } else {
            self.state = VmState::Stopped;
        }
    }

    /// Wrap the buffer, show the first page, and pause for a keypress.
    fn flush(&mut self, host: &mut dyn Host) {
        let lines = wrap_text(&self.buffer, self.line_max_len);
        self.buffer.clear();
        if lines.is_empty() {
            return;
        }
        self.pending_lines = lines;
        self.page_start = 0;
        self.emit_page(host);
        self.state = VmState::ScreenPause;
    }

    fn emit_page(&mut self, host: &mut dyn Host) {
        let end = (self.page_start + PAGE_LINES).min(self.pending_lines.len());
        host.set_text(&self.pending_lines[self.page_start..end].join("\n"));
    }

    fn offer_selections(&mut self, host: &mut dyn Host) {
        host.set_selections(&self.selections);
        self.state = VmState::WaitingForSelection;
    }

    fn fatal(&mut self, host: &mut dyn Host, err: RuntimeError) {
        host.fatal_error(&err.to_string());
        self.state = VmState::Stopped;
    }

    // ── Expression evaluation ──────────────────────────────────────────

    fn eval(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Variable(name) => Ok(self
                .variables
                .get(name)
                .cloned()
                .unwrap_or_else(|| Value::Str(String::new()))),
            Expr::Call { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                builtins::call(name, &values, &mut self.rng)
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!value.as_bool()),
                    UnaryOp::Neg => Value::Int(value.as_int().wrapping_neg()),
                })
            }
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right),
        }
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Value, RuntimeError> {
        // `or` and `and` short-circuit: the right side is only evaluated
        // when the left side does not decide the result.
        match op {
            BinaryOp::Or => {
                if self.eval(left)?.as_bool() {
                    return Ok(Value::Bool(true));
                }
                return Ok(Value::Bool(self.eval(right)?.as_bool()));
            }
            BinaryOp::And => {
                if !self.eval(left)?.as_bool() {
                    return Ok(Value::Bool(false));
                }
                return Ok(Value::Bool(self.eval(right)?.as_bool()));
            }
            _ => {}
        }

        let l = self.eval(left)?;
        let r = self.eval(right)?;
        match op {
            BinaryOp::Eq | BinaryOp::NotEq => {
                let equal = match (&l, &r) {
                    (Value::Int(a), Value::Int(b)) => a == b,
                    (Value::Bool(a), Value::Bool(b)) => a == b,
                    (Value::Str(a), Value::Str(b)) => a == b,
                    _ => {
                        return Err(RuntimeError::MismatchedComparison {
                            left: l.type_name(),
                            right: r.type_name(),
                        })
                    }
                };
                Ok(Value::Bool(if op == BinaryOp::Eq { equal } else { !equal }))
            }
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
                let (Value::Int(a), Value::Int(b)) = (&l, &r) else {
                    return Err(RuntimeError::UnorderedComparison {
                        left: l.type_name(),
                        right: r.type_name(),
                    });
                };
                Ok(Value::Bool(match op {
                    BinaryOp::Lt => a < b,
                    BinaryOp::Gt => a > b,
                    BinaryOp::Le => a <= b,
                    _ => a >= b,
                }))
            }
            BinaryOp::Add => Ok(Value::Int(l.as_int().wrapping_add(r.as_int()))),
            BinaryOp::Sub => Ok(Value::Int(l.as_int().wrapping_sub(r.as_int()))),
            BinaryOp::Mul => Ok(Value::Int(l.as_int().wrapping_mul(r.as_int()))),
            BinaryOp::Div | BinaryOp::Rem => {
                let b = r.as_int();
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                let a = l.as_int();
                Ok(Value::Int(if op == BinaryOp::Div {
                    a.wrapping_div(b)
                } else {
                    a.wrapping_rem(b)
                }))
            }
            BinaryOp::Or | BinaryOp::And => unreachable!("handled above"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::Passage;

    /// Records every host callback in order.
    #[derive(Default)]
    struct RecordingHost {
        calls: Vec<String>,
    }

    impl Host for RecordingHost {
        fn set_text(&mut self, text: &str) {
            self.calls.push(format!("text:{text}"));
        }
        fn set_image(&mut self, name: &str) {
            self.calls.push(format!("image:{name}"));
        }
        fn set_music(&mut self, name: &str, track: i32) {
            self.calls.push(format!("music:{name}:{track}"));
        }
        fn set_selections(&mut self, selections: &[Selection]) {
            let list: Vec<String> = selections
                .iter()
                .map(|s| format!("{}|{}", s.text, s.target))
                .collect();
            self.calls.push(format!("selections:[{}]", list.join(",")));
        }
        fn fatal_error(&mut self, message: &str) {
            self.calls.push(format!("fatal:{message}"));
        }
    }

    fn story(passages: Vec<(&str, Vec<Command>)>) -> Story {
        let mut story = Story::new();
        for (name, commands) in passages {
            story.insert(Passage {
                name: name.to_string(),
                commands,
            });
        }
        story
    }

    fn text(s: &str) -> Command {
        Command::PrintText { text: s.to_string() }
    }

    fn vm(passages: Vec<(&str, Vec<Command>)>) -> Vm {
        Vm::with_seed(story(passages), 30, 1)
    }

    // ── Basic flow ────────────────────────────────────────────────────

    #[test]
    fn empty_start_stops_immediately() {
        let mut vm = vm(vec![("Start", vec![])]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(vm.state(), VmState::Stopped);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn pause_flushes_buffer_and_suspends() {
        let mut vm = vm(vec![("Start", vec![text("Hello"), Command::Pause])]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(vm.state(), VmState::ScreenPause);
        assert_eq!(host.calls, vec!["text:Hello"]);

        vm.player_input(0, &mut host);
        assert_eq!(vm.state(), VmState::Stopped);
        assert_eq!(host.calls, vec!["text:Hello"]);
    }

    #[test]
    fn pause_with_empty_buffer_is_a_no_op() {
        let mut vm = vm(vec![("Start", vec![Command::Pause])]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(vm.state(), VmState::Stopped);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn end_of_passage_flushes_pending_text() {
        let mut vm = vm(vec![("Start", vec![text("tail")])]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(vm.state(), VmState::ScreenPause);
        assert_eq!(host.calls, vec!["text:tail"]);
        vm.player_input(0, &mut host);
        assert_eq!(vm.state(), VmState::Stopped);
    }

    #[test]
    fn input_ignored_while_stopped() {
        let mut vm = vm(vec![("Start", vec![])]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        vm.player_input(0, &mut host);
        assert_eq!(vm.state(), VmState::Stopped);
        assert!(host.calls.is_empty());
    }

    // ── Paging ────────────────────────────────────────────────────────

    #[test]
    fn long_text_pages_with_one_line_overlap() {
        // Ten one-word lines, each line its own page row.
        let body = (1..=10).map(|i| format!("line{i}")).collect::<Vec<_>>().join("\n");
        let mut vm = vm(vec![("Start", vec![text(&body), Command::Pause])]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(vm.state(), VmState::ScreenPause);
        assert_eq!(host.calls, vec!["text:line1\nline2\nline3\nline4\nline5\nline6"]);

        vm.player_input(0, &mut host);
        assert_eq!(vm.state(), VmState::ScreenPause);
        // Window slid by five: line6 repeats at the top.
        assert_eq!(host.calls[1], "text:line6\nline7\nline8\nline9\nline10");

        vm.player_input(0, &mut host);
        assert_eq!(vm.state(), VmState::Stopped);
    }

    #[test]
    fn exactly_six_lines_is_a_single_page() {
        let body = (1..=6).map(|i| format!("l{i}")).collect::<Vec<_>>().join("\n");
        let mut vm = vm(vec![("Start", vec![text(&body), Command::Pause])]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(host.calls.len(), 1);
        vm.player_input(0, &mut host);
        assert_eq!(vm.state(), VmState::Stopped);
    }

    // ── Selections ────────────────────────────────────────────────────

    fn selection_story() -> Vec<(&'static str, Vec<Command>)> {
        vec![
            (
                "Start",
                vec![
                    text("Pick:\n"),
                    Command::AddSelection { text: "Left".into(), target: "L".into() },
                    Command::AddSelection { text: "Right".into(), target: "R".into() },
                ],
            ),
            ("L", vec![text("Went left."), Command::Pause]),
            ("R", vec![text("Went right."), Command::Pause]),
        ]
    }

    #[test]
    fn selections_offered_with_prompt_text_in_one_tick() {
        let mut vm = vm(selection_story());
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(vm.state(), VmState::WaitingForSelection);
        assert_eq!(
            host.calls,
            vec!["text:Pick:", "selections:[Left|L,Right|R]"]
        );
    }

    #[test]
    fn confirming_a_selection_runs_the_target() {
        let mut vm = vm(selection_story());
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        vm.player_input(1, &mut host);
        assert_eq!(vm.state(), VmState::ScreenPause);
        assert_eq!(
            host.calls[2..],
            ["selections:[]".to_string(), "text:Went right.".to_string()]
        );
    }

    #[test]
    fn out_of_range_selection_is_ignored() {
        let mut vm = vm(selection_story());
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        vm.player_input(5, &mut host);
        assert_eq!(vm.state(), VmState::WaitingForSelection);
    }

    #[test]
    fn unknown_selection_target_is_fatal() {
        let mut vm = vm(vec![(
            "Start",
            vec![Command::AddSelection { text: "Go".into(), target: "Gone".into() }],
        )]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        vm.player_input(0, &mut host);
        assert_eq!(vm.state(), VmState::Stopped);
        assert_eq!(
            host.calls.last().unwrap(),
            "fatal:Unknown selection target \"Gone\"."
        );
    }

    // ── Jumps, calls, returns ─────────────────────────────────────────

    #[test]
    fn jump_resets_instruction_pointer() {
        let mut vm = vm(vec![
            ("Start", vec![Command::JumpToPassage { target: "Two".into() }, text("skipped")]),
            ("Two", vec![text("landed"), Command::Pause]),
        ]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(host.calls, vec!["text:landed"]);
    }

    #[test]
    fn unknown_jump_target_is_fatal() {
        let mut vm = vm(vec![(
            "Start",
            vec![Command::JumpToPassage { target: "Nowhere".into() }],
        )]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(vm.state(), VmState::Stopped);
        assert_eq!(host.calls, vec!["fatal:Unknown jump target \"Nowhere\"."]);
    }

    #[test]
    fn call_and_return_resume_after_the_call() {
        let mut vm = vm(vec![
            (
                "Start",
                vec![text("A"), Command::CallPassage { target: "Sub".into() }, text("B"), Command::Pause],
            ),
            ("Sub", vec![text("[sub]"), Command::ReturnPassage]),
        ]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(host.calls, vec!["text:A[sub]B"]);
    }

    #[test]
    fn return_without_call_is_fatal() {
        let mut vm = vm(vec![("Start", vec![Command::ReturnPassage])]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(
            host.calls,
            vec!["fatal:Return with no calling passage."]
        );
    }

    #[test]
    fn runaway_recursion_overflows_the_stack() {
        let mut vm = vm(vec![(
            "Start",
            vec![Command::CallPassage { target: "Start".into() }],
        )]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(vm.state(), VmState::Stopped);
        assert_eq!(
            host.calls,
            vec![format!("fatal:Call stack overflow (limit {CALL_STACK_LIMIT}).")]
        );
    }

    // ── Variables and expressions ─────────────────────────────────────

    fn set(name: &str, value: Expr) -> Command {
        Command::SetVariable { name: name.to_string(), value }
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    #[test]
    fn arithmetic_prints_through_the_buffer() {
        let mut vm = vm(vec![(
            "Start",
            vec![
                set("x", Expr::Int(2)),
                set("y", Expr::Int(3)),
                Command::PrintResult {
                    value: binary(
                        BinaryOp::Add,
                        binary(BinaryOp::Mul, Expr::Variable("x".into()), Expr::Variable("y".into())),
                        Expr::Int(1),
                    ),
                },
                Command::Pause,
            ],
        )]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(host.calls, vec!["text:7"]);
    }

    #[test]
    fn unknown_variable_reads_as_empty_string() {
        let mut vm = vm(vec![(
            "Start",
            vec![
                Command::PrintResult { value: Expr::Variable("ghost".into()) },
                text("|"),
                Command::Pause,
            ],
        )]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(host.calls, vec!["text:|"]);
    }

    #[test]
    fn or_short_circuits_past_division_by_zero() {
        // true or (1 / x) with x = 0: the right side must not evaluate.
        let mut vm = vm(vec![(
            "Start",
            vec![
                set("x", Expr::Int(0)),
                Command::If {
                    condition: binary(
                        BinaryOp::Or,
                        Expr::Bool(true),
                        binary(BinaryOp::Div, Expr::Int(1), Expr::Variable("x".into())),
                    ),
                    skip_count: 2,
                },
                text("ok"),
                Command::Pause,
            ],
        )]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(host.calls, vec!["text:ok"]);
    }

    #[test]
    fn and_short_circuits_on_false_left() {
        let mut vm = vm(vec![(
            "Start",
            vec![
                set("x", Expr::Int(0)),
                Command::If {
                    condition: binary(
                        BinaryOp::And,
                        Expr::Bool(false),
                        binary(BinaryOp::Div, Expr::Int(1), Expr::Variable("x".into())),
                    ),
                    skip_count: 2,
                },
                text("unreachable"),
                Command::Pause,
            ],
        )]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(vm.state(), VmState::Stopped);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn division_by_zero_is_fatal_when_evaluated() {
        let mut vm = vm(vec![(
            "Start",
            vec![Command::PrintResult {
                value: binary(BinaryOp::Div, Expr::Int(1), Expr::Int(0)),
            }],
        )]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(host.calls, vec!["fatal:Division by zero."]);
    }

    #[test]
    fn if_true_runs_body_once() {
        let mut vm = vm(vec![(
            "Start",
            vec![
                Command::If { condition: Expr::Bool(true), skip_count: 2 },
                text("body"),
                Command::Pause,
            ],
        )]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(host.calls, vec!["text:body"]);
    }

    #[test]
    fn if_false_skips_body() {
        let mut vm = vm(vec![(
            "Start",
            vec![
                Command::If { condition: Expr::Bool(false), skip_count: 2 },
                text("body"),
                text("after"),
                Command::Pause,
            ],
        )]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(host.calls, vec!["text:after"]);
    }

    #[test]
    fn mismatched_equality_is_fatal() {
        let mut vm = vm(vec![(
            "Start",
            vec![Command::If {
                condition: binary(BinaryOp::Eq, Expr::Int(1), Expr::Str("1".into())),
                skip_count: 1,
            }],
        )]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(host.calls, vec!["fatal:Cannot compare int and string."]);
    }

    #[test]
    fn ordering_requires_ints() {
        let mut vm = vm(vec![(
            "Start",
            vec![Command::If {
                condition: binary(BinaryOp::Lt, Expr::Str("a".into()), Expr::Str("b".into())),
                skip_count: 1,
            }],
        )]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(host.calls, vec!["fatal:Cannot order string and string."]);
    }

    #[test]
    fn string_equality_compares_contents() {
        let mut vm = vm(vec![(
            "Start",
            vec![
                set("name", Expr::Str("elm".into())),
                Command::If {
                    condition: binary(
                        BinaryOp::Eq,
                        Expr::Variable("name".into()),
                        Expr::Str("elm".into()),
                    ),
                    skip_count: 2,
                },
                text("match"),
                Command::Pause,
            ],
        )]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(host.calls, vec!["text:match"]);
    }

    #[test]
    fn random_builtin_reaches_the_buffer() {
        let mut vm = vm(vec![(
            "Start",
            vec![
                Command::PrintResult {
                    value: Expr::Call {
                        name: "random".into(),
                        args: vec![Expr::Int(4), Expr::Int(4)],
                    },
                },
                Command::Pause,
            ],
        )]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(host.calls, vec!["text:4"]);
    }

    #[test]
    fn builtin_arity_error_is_fatal() {
        let mut vm = vm(vec![(
            "Start",
            vec![Command::PrintResult {
                value: Expr::Call { name: "random".into(), args: vec![Expr::Int(1)] },
            }],
        )]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(
            host.calls,
            vec!["fatal:Function \"random\" expects 2 argument(s), got 1."]
        );
    }

    // ── Side-effect commands ──────────────────────────────────────────

    #[test]
    fn image_and_music_reach_the_host_in_order() {
        let mut vm = vm(vec![(
            "Start",
            vec![
                Command::SetImage { name: "castle".into() },
                Command::SetMusic { name: "theme".into(), track: Expr::Int(2) },
            ],
        )]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(host.calls, vec!["image:castle", "music:theme:2"]);
    }

    #[test]
    fn music_track_expression_is_evaluated() {
        let mut vm = vm(vec![(
            "Start",
            vec![
                set("t", Expr::Int(3)),
                Command::SetMusic { name: "battle".into(), track: Expr::Variable("t".into()) },
            ],
        )]);
        let mut host = RecordingHost::default();
        vm.run(&mut host);
        assert_eq!(host.calls, vec!["music:battle:3"]);
    }
}
