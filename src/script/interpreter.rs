// src/script/interpreter.rs

//! Tree-walking evaluator for parsed strategy scripts.

use super::ast::{
    BinaryOp, DeclKind, Expr, FunctionBody, LogicalOp, Program, PropKey, Stmt, TemplatePart,
    UnaryOp,
};
use super::builtins;
use super::error::ScriptError;
use super::value::{
    format_number, release, Closure, DisplayOverflow, Object, ScopeId, Value, MAX_DISPLAY_DEPTH,
};
use crate::config::{ScriptSettings, MAX_CALL_DEPTH};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::debug;

const GLOBAL: ScopeId = 0;

/// How often (in steps) the wall clock is consulted.
const CLOCK_CHECK_INTERVAL: u64 = 1024;

/// Statements and expressions being evaluated at once, across all calls.
pub const MAX_EVAL_DEPTH: usize = 384;

#[derive(Debug)]
struct Binding {
    value: Value,
    mutable: bool,
}

#[derive(Debug)]
struct Scope {
    vars: HashMap<String, Binding>,
    parent: Option<ScopeId>,
    /// `var` declarations are hoisted to the nearest function scope.
    function_scope: bool,
}

/// Statement completion.
enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// Assignment target resolved once, so `a[i()] += 1` evaluates `i()` once.
enum Place {
    Var(String),
    Prop { target: Value, key: Value },
}

/// An isolated evaluation context.
///
/// Each interpreter owns a fresh global scope populated only with the
/// builtins, so nothing leaks between two evaluations. Every statement,
/// expression and call consumes one step from a shared budget. The budget,
/// the wall-clock limit, the call-depth and evaluation-depth limits and the
/// collection-size limit all abort evaluation with an error that scripts
/// cannot catch.
///
/// # Examples
///
/// ```
/// # use tacqubo::script::{parse, Interpreter, Value};
/// # use tacqubo::ScriptSettings;
/// let program = parse("var total = 0; for (let i = 1; i <= 4; i++) { total += i; }").unwrap();
/// let mut interpreter = Interpreter::new(ScriptSettings::default());
/// interpreter.run(&program).unwrap();
/// assert!(matches!(interpreter.global("total"), Some(Value::Number(n)) if n == 10.0));
/// ```
#[derive(Debug)]
pub struct Interpreter {
    scopes: Vec<Scope>,
    limits: ScriptSettings,
    steps: u64,
    started: Instant,
    depth: usize,
    nesting: usize,
    /// Value carried by the `throw` currently unwinding, if any.
    thrown: Option<Value>,
    pub(crate) rng: StdRng,
}

impl Interpreter {
    /// Creates an interpreter with a fresh global scope and the given limits.
    pub fn new(limits: ScriptSettings) -> Self {
        let mut interpreter = Self {
            scopes: vec![Scope { vars: HashMap::new(), parent: None, function_scope: true }],
            rng: StdRng::seed_from_u64(limits.random_seed),
            limits,
            steps: 0,
            started: Instant::now(),
            depth: 0,
            nesting: 0,
            thrown: None,
        };
        for (name, value) in builtins::globals() {
            interpreter.declare(GLOBAL, name, value, true);
        }
        interpreter
    }

    /// Evaluates a program's top-level statements in the global scope.
    ///
    /// A top-level `return` stops evaluation early without error.
    ///
    /// # Errors
    /// Any uncaught script error or exhausted limit.
    pub fn run(&mut self, program: &Program) -> Result<(), ScriptError> {
        debug!(statements = program.statement_count(), "evaluating script");
        self.hoist(&program.body, GLOBAL);
        for stmt in &program.body {
            match self.exec_stmt(stmt, GLOBAL)? {
                Flow::Normal => {}
                Flow::Return(_) | Flow::Break | Flow::Continue => break,
            }
        }
        debug!(steps = self.steps, "script evaluated");
        Ok(())
    }

    /// Reads a binding from the global scope.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.scopes[GLOBAL].vars.get(name).map(|binding| binding.value.clone())
    }

    /// Number of evaluation steps consumed so far.
    pub fn steps_used(&self) -> u64 {
        self.steps
    }

    /// Calls a script or native function.
    ///
    /// # Errors
    /// `ScriptError::Type` if `callee` is not callable, otherwise whatever the
    /// function raises.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, ScriptError> {
        self.tick()?;
        match callee {
            Value::Function(closure) => self.call_closure(Rc::clone(closure), args),
            Value::Native(native) => builtins::call_native(self, native, args),
            other => Err(ScriptError::type_error(format!(
                "{} is not a function",
                other.to_display_string()
            ))),
        }
    }

    // --- limits ---

    fn tick(&mut self) -> Result<(), ScriptError> {
        self.steps += 1;
        if self.steps > self.limits.step_budget {
            return Err(ScriptError::StepBudgetExhausted { budget: self.limits.step_budget });
        }
        if self.steps % CLOCK_CHECK_INTERVAL == 0
            && self.started.elapsed() > Duration::from_millis(self.limits.time_budget_ms)
        {
            return Err(ScriptError::TimeBudgetExhausted { budget_ms: self.limits.time_budget_ms });
        }
        Ok(())
    }

    fn enter(&mut self) -> Result<(), ScriptError> {
        if self.nesting >= MAX_EVAL_DEPTH {
            return Err(ScriptError::NestingTooDeep { limit: MAX_EVAL_DEPTH });
        }
        self.nesting += 1;
        Ok(())
    }

    /// String conversion charged against the collection-size limit.
    pub(crate) fn stringify(&self, value: &Value) -> Result<String, ScriptError> {
        let limit = self.limits.max_collection_len;
        value.display_within(limit).map_err(|overflow| match overflow {
            DisplayOverflow::Length(requested) => ScriptError::CollectionTooLarge { requested, limit },
            DisplayOverflow::Depth => ScriptError::NestingTooDeep { limit: MAX_DISPLAY_DEPTH },
        })
    }

    /// Rejects arrays and strings longer than the configured limit.
    pub(crate) fn check_len(&self, requested: usize) -> Result<(), ScriptError> {
        if requested > self.limits.max_collection_len {
            return Err(ScriptError::CollectionTooLarge {
                requested,
                limit: self.limits.max_collection_len,
            });
        }
        Ok(())
    }

    // --- scopes ---

    fn new_scope(&mut self, parent: ScopeId, function_scope: bool) -> ScopeId {
        self.scopes.push(Scope { vars: HashMap::new(), parent: Some(parent), function_scope });
        self.scopes.len() - 1
    }

    fn resolve(&self, mut scope: ScopeId, name: &str) -> Option<ScopeId> {
        loop {
            if self.scopes[scope].vars.contains_key(name) {
                return Some(scope);
            }
            scope = self.scopes[scope].parent?;
        }
    }

    fn function_scope_of(&self, mut scope: ScopeId) -> ScopeId {
        while !self.scopes[scope].function_scope {
            match self.scopes[scope].parent {
                Some(parent) => scope = parent,
                None => break,
            }
        }
        scope
    }

    fn declare(&mut self, scope: ScopeId, name: &str, value: Value, mutable: bool) {
        self.scopes[scope].vars.insert(name.to_string(), Binding { value, mutable });
    }

    fn lookup(&self, scope: ScopeId, name: &str) -> Result<Value, ScriptError> {
        self.resolve(scope, name)
            .and_then(|id| self.scopes[id].vars.get(name))
            .map(|binding| binding.value.clone())
            .ok_or_else(|| ScriptError::Reference { name: name.to_string() })
    }

    /// Assigns to the nearest binding; an undeclared name becomes a global.
    fn assign(&mut self, scope: ScopeId, name: &str, value: Value) -> Result<(), ScriptError> {
        let target = self.resolve(scope, name).unwrap_or(GLOBAL);
        match self.scopes[target].vars.get_mut(name) {
            Some(binding) if !binding.mutable => {
                Err(ScriptError::type_error(format!("Assignment to constant variable '{name}'")))
            }
            Some(binding) => {
                release(std::mem::replace(&mut binding.value, value));
                Ok(())
            }
            None => {
                self.declare(GLOBAL, name, value, true);
                Ok(())
            }
        }
    }

    // --- hoisting ---

    fn hoist(&mut self, body: &[Stmt], scope: ScopeId) {
        let var_scope = self.function_scope_of(scope);
        for stmt in body {
            self.hoist_vars(stmt, var_scope);
        }
        self.hoist_functions(body, scope);
    }

    fn hoist_functions(&mut self, body: &[Stmt], scope: ScopeId) {
        for stmt in body {
            if let Stmt::Function(def) = stmt {
                if let Some(name) = &def.name {
                    let closure = Value::Function(Rc::new(Closure { def: Rc::clone(def), scope }));
                    self.declare(scope, name, closure, true);
                }
            }
        }
    }

    fn hoist_vars(&mut self, stmt: &Stmt, var_scope: ScopeId) {
        let declare_var = |this: &mut Self, name: &str| {
            if !this.scopes[var_scope].vars.contains_key(name) {
                this.declare(var_scope, name, Value::Undefined, true);
            }
        };
        match stmt {
            Stmt::Var { kind: DeclKind::Var, decls } => {
                for (name, _) in decls {
                    declare_var(self, name);
                }
            }
            Stmt::If { then, otherwise, .. } => {
                self.hoist_vars(then, var_scope);
                if let Some(otherwise) = otherwise {
                    self.hoist_vars(otherwise, var_scope);
                }
            }
            Stmt::While { body, .. } | Stmt::DoWhile { body, .. } => self.hoist_vars(body, var_scope),
            Stmt::For { init, body, .. } => {
                if let Some(init) = init {
                    self.hoist_vars(init, var_scope);
                }
                self.hoist_vars(body, var_scope);
            }
            Stmt::ForOf { kind, name, body, .. } | Stmt::ForIn { kind, name, body, .. } => {
                if *kind == Some(DeclKind::Var) {
                    declare_var(self, name);
                }
                self.hoist_vars(body, var_scope);
            }
            Stmt::Block(stmts) => {
                for stmt in stmts {
                    self.hoist_vars(stmt, var_scope);
                }
            }
            Stmt::Try { block, handler, finalizer, .. } => {
                let nested = block
                    .iter()
                    .chain(handler.iter().flatten())
                    .chain(finalizer.iter().flatten());
                for stmt in nested {
                    self.hoist_vars(stmt, var_scope);
                }
            }
            _ => {}
        }
    }

    // --- statements ---

    fn exec_block(&mut self, body: &[Stmt], scope: ScopeId) -> Result<Flow, ScriptError> {
        let needs_scope = body.iter().any(|stmt| {
            matches!(stmt, Stmt::Var { kind: DeclKind::Let | DeclKind::Const, .. } | Stmt::Function(_))
        });
        let inner = if needs_scope {
            let inner = self.new_scope(scope, false);
            self.hoist_functions(body, inner);
            inner
        } else {
            scope
        };
        for stmt in body {
            match self.exec_stmt(stmt, inner)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, scope: ScopeId) -> Result<Flow, ScriptError> {
        self.enter()?;
        let flow = self.exec_stmt_inner(stmt, scope);
        self.nesting -= 1;
        flow
    }

    fn exec_stmt_inner(&mut self, stmt: &Stmt, scope: ScopeId) -> Result<Flow, ScriptError> {
        self.tick()?;
        match stmt {
            Stmt::Var { kind, decls } => {
                for (name, init) in decls {
                    let value = match init {
                        Some(expr) => self.eval(expr, scope)?,
                        None => Value::Undefined,
                    };
                    match kind {
                        DeclKind::Var if init.is_some() => self.assign(scope, name, value)?,
                        DeclKind::Var => {}
                        DeclKind::Let => self.declare(scope, name, value, true),
                        DeclKind::Const => self.declare(scope, name, value, false),
                    }
                }
                Ok(Flow::Normal)
            }
            // Already bound during hoisting.
            Stmt::Function(_) | Stmt::Empty => Ok(Flow::Normal),
            Stmt::Expr(expr) => {
                self.eval(expr, scope)?;
                Ok(Flow::Normal)
            }
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, scope)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Stmt::If { cond, then, otherwise } => {
                if self.eval(cond, scope)?.truthy() {
                    self.exec_stmt(then, scope)
                } else if let Some(otherwise) = otherwise {
                    self.exec_stmt(otherwise, scope)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { cond, body } => {
                while self.eval(cond, scope)?.truthy() {
                    match self.exec_stmt(body, scope)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::DoWhile { body, cond } => {
                loop {
                    match self.exec_stmt(body, scope)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    if !self.eval(cond, scope)?.truthy() {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For { init, cond, update, body } => self.exec_for(init.as_deref(), cond.as_ref(), update.as_ref(), body, scope),
            Stmt::ForOf { kind, name, iterable, body } => {
                let iterable = self.eval(iterable, scope)?;
                let mut index = 0;
                loop {
                    let item = match &iterable {
                        Value::Array(items) => match items.borrow().get(index) {
                            Some(item) => item.clone(),
                            None => break,
                        },
                        Value::Str(s) => match s.chars().nth(index) {
                            Some(c) => Value::str(c.encode_utf8(&mut [0; 4])),
                            None => break,
                        },
                        other => {
                            return Err(ScriptError::type_error(format!(
                                "{} is not iterable",
                                other.to_display_string()
                            )))
                        }
                    };
                    index += 1;
                    match self.exec_loop_body(*kind, name, item, body, scope)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::ForIn { kind, name, object, body } => {
                let object = self.eval(object, scope)?;
                for key in builtins::own_keys(&object) {
                    match self.exec_loop_body(*kind, name, Value::str(&key), body, scope)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Block(body) => self.exec_block(body, scope),
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Throw(expr) => {
                let value = self.eval(expr, scope)?;
                let message = value.to_display_string();
                self.thrown = Some(value);
                Err(ScriptError::Thrown { message })
            }
            Stmt::Try { block, param, handler, finalizer } => {
                let mut result = self.exec_block(block, scope);
                if let (Err(err), Some(handler)) = (&result, handler) {
                    if err.is_catchable() {
                        let caught = self.caught_value(err);
                        let handler_scope = self.new_scope(scope, false);
                        if let Some(param) = param {
                            self.declare(handler_scope, param, caught, true);
                        }
                        result = self.exec_block(handler, handler_scope);
                    }
                }
                if let Some(finalizer) = finalizer {
                    if matches!(&result, Err(err) if !err.is_catchable()) {
                        return result;
                    }
                    match self.exec_block(finalizer, scope)? {
                        Flow::Normal => {}
                        flow => return Ok(flow),
                    }
                }
                result
            }
        }
    }

    fn exec_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
        scope: ScopeId,
    ) -> Result<Flow, ScriptError> {
        let lexical = matches!(init, Some(Stmt::Var { kind: DeclKind::Let | DeclKind::Const, .. }));
        let loop_scope = if lexical { self.new_scope(scope, false) } else { scope };
        if let Some(init) = init {
            self.exec_stmt(init, loop_scope)?;
        }
        loop {
            if let Some(cond) = cond {
                if !self.eval(cond, loop_scope)?.truthy() {
                    break;
                }
            } else {
                self.tick()?;
            }
            match self.exec_stmt(body, loop_scope)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }
            if let Some(update) = update {
                self.eval(update, loop_scope)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_loop_body(
        &mut self,
        kind: Option<DeclKind>,
        name: &str,
        item: Value,
        body: &Stmt,
        scope: ScopeId,
    ) -> Result<Flow, ScriptError> {
        match kind {
            Some(DeclKind::Let | DeclKind::Const) => {
                let iteration = self.new_scope(scope, false);
                self.declare(iteration, name, item, kind != Some(DeclKind::Const));
                self.exec_stmt(body, iteration)
            }
            Some(DeclKind::Var) | None => {
                self.assign(scope, name, item)?;
                self.exec_stmt(body, scope)
            }
        }
    }

    /// The value bound by a `catch (e)` clause.
    fn caught_value(&mut self, err: &ScriptError) -> Value {
        let message = match err {
            ScriptError::Thrown { message } => {
                return self.thrown.take().unwrap_or_else(|| Value::str(message));
            }
            ScriptError::Reference { name } => format!("{name} is not defined"),
            ScriptError::Type { message } => message.clone(),
            other => other.to_string(),
        };
        builtins::error_object(err.script_name(), &message)
    }

    // --- functions ---

    fn call_closure(&mut self, closure: Rc<Closure>, args: Vec<Value>) -> Result<Value, ScriptError> {
        let limit = self.limits.max_call_depth.min(MAX_CALL_DEPTH);
        if self.depth >= limit {
            return Err(ScriptError::CallDepthExceeded { limit });
        }
        self.depth += 1;
        let result = self.invoke(&closure, args);
        self.depth -= 1;
        result
    }

    fn invoke(&mut self, closure: &Closure, args: Vec<Value>) -> Result<Value, ScriptError> {
        let def = Rc::clone(&closure.def);
        let scope = self.new_scope(closure.scope, true);
        let mut args = args.into_iter();
        for param in &def.params {
            self.declare(scope, param, args.next().unwrap_or_default(), true);
        }
        match &def.body {
            FunctionBody::Expr(expr) => self.eval(expr, scope),
            FunctionBody::Block(body) => {
                self.hoist(body, scope);
                for stmt in body {
                    if let Flow::Return(value) = self.exec_stmt(stmt, scope)? {
                        return Ok(value);
                    }
                }
                Ok(Value::Undefined)
            }
        }
    }

    // --- expressions ---

    fn eval(&mut self, expr: &Expr, scope: ScopeId) -> Result<Value, ScriptError> {
        self.enter()?;
        let value = self.eval_inner(expr, scope);
        self.nesting -= 1;
        value
    }

    fn eval_inner(&mut self, expr: &Expr, scope: ScopeId) -> Result<Value, ScriptError> {
        self.tick()?;
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::str(s)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),
            Expr::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => out.push_str(text),
                        TemplatePart::Expr(expr) => {
                            let value = self.eval(expr, scope)?;
                            out.push_str(&self.stringify(&value)?);
                        }
                    }
                    self.check_len(out.len())?;
                }
                Ok(Value::str(&out))
            }
            Expr::Ident(name) => self.lookup(scope, name),
            Expr::Array(elements) => {
                self.check_len(elements.len())?;
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.eval(element, scope)?);
                }
                Ok(Value::array(items))
            }
            Expr::Object(props) => {
                let mut object = Object::new();
                for (key, value) in props {
                    let key = match key {
                        PropKey::Static(key) => key.clone(),
                        PropKey::Computed(expr) => property_key(&self.eval(expr, scope)?),
                    };
                    let value = self.eval(value, scope)?;
                    object.set(key, value);
                }
                Ok(Value::object(object))
            }
            Expr::Function(def) => Ok(Value::Function(Rc::new(Closure { def: Rc::clone(def), scope }))),
            Expr::Unary { op: UnaryOp::Typeof, expr } => {
                if let Expr::Ident(name) = expr.as_ref() {
                    if self.resolve(scope, name).is_none() {
                        return Ok(Value::str("undefined"));
                    }
                }
                Ok(Value::str(self.eval(expr, scope)?.type_of()))
            }
            Expr::Unary { op, expr } => {
                let value = self.eval(expr, scope)?;
                Ok(match op {
                    UnaryOp::Neg => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                    UnaryOp::Not => Value::Bool(!value.truthy()),
                    UnaryOp::Typeof => Value::str(value.type_of()),
                })
            }
            Expr::Update { increment, prefix, target } => {
                let place = self.place(target, scope)?;
                let old = self.read_place(&place, scope)?.to_number();
                let new = if *increment { old + 1.0 } else { old - 1.0 };
                self.write_place(place, Value::Number(new), scope)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                self.binary(*op, &left, &right)
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left, scope)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.truthy(),
                    LogicalOp::Or => left.truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if short_circuit { Ok(left) } else { self.eval(right, scope) }
            }
            Expr::Conditional { cond, then, otherwise } => {
                if self.eval(cond, scope)?.truthy() {
                    self.eval(then, scope)
                } else {
                    self.eval(otherwise, scope)
                }
            }
            Expr::Assign { op, target, value } => {
                let place = self.place(target, scope)?;
                let value = match op {
                    Some(op) => {
                        let current = self.read_place(&place, scope)?;
                        let rhs = self.eval(value, scope)?;
                        self.binary(*op, &current, &rhs)?
                    }
                    None => self.eval(value, scope)?,
                };
                self.write_place(place, value.clone(), scope)?;
                Ok(value)
            }
            Expr::Member { object, property } => {
                let object = self.eval(object, scope)?;
                builtins::get_property(&object, property)
            }
            Expr::Index { object, index } => {
                let object = self.eval(object, scope)?;
                let index = self.eval(index, scope)?;
                builtins::get_property(&object, &property_key(&index))
            }
            Expr::Call { callee, args } => {
                let function = self.eval(callee, scope)?;
                if !function.is_callable() {
                    return Err(ScriptError::type_error(format!("{} is not a function", describe(callee))));
                }
                let args = self.eval_args(args, scope)?;
                self.call(&function, args)
            }
            Expr::New { callee, args } => {
                let constructor = self.eval(callee, scope)?;
                let args = self.eval_args(args, scope)?;
                match &constructor {
                    Value::Native(_) | Value::Function(_) => {
                        let result = self.call(&constructor, args)?;
                        Ok(match result {
                            Value::Array(_) | Value::Object(_) => result,
                            _ => Value::object(Object::new()),
                        })
                    }
                    _ => Err(ScriptError::type_error(format!("{} is not a constructor", describe(callee)))),
                }
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr], scope: ScopeId) -> Result<Vec<Value>, ScriptError> {
        args.iter().map(|arg| self.eval(arg, scope)).collect()
    }

    fn place(&mut self, target: &Expr, scope: ScopeId) -> Result<Place, ScriptError> {
        match target {
            Expr::Ident(name) => Ok(Place::Var(name.clone())),
            Expr::Member { object, property } => Ok(Place::Prop {
                target: self.eval(object, scope)?,
                key: Value::str(property),
            }),
            Expr::Index { object, index } => Ok(Place::Prop {
                target: self.eval(object, scope)?,
                key: self.eval(index, scope)?,
            }),
            _ => Err(ScriptError::type_error("Invalid assignment target")),
        }
    }

    fn read_place(&self, place: &Place, scope: ScopeId) -> Result<Value, ScriptError> {
        match place {
            Place::Var(name) => self.lookup(scope, name),
            Place::Prop { target, key } => builtins::get_property(target, &property_key(key)),
        }
    }

    fn write_place(&mut self, place: Place, value: Value, scope: ScopeId) -> Result<(), ScriptError> {
        match place {
            Place::Var(name) => self.assign(scope, &name, value),
            Place::Prop { target, key } => self.set_property(&target, &property_key(&key), value),
        }
    }

    fn set_property(&self, target: &Value, key: &str, value: Value) -> Result<(), ScriptError> {
        match target {
            Value::Object(object) => {
                object.borrow_mut().set(key, value);
                Ok(())
            }
            Value::Array(items) => {
                if key == "length" {
                    let len = builtins::array_length(value.to_number())?;
                    self.check_len(len)?;
                    items.borrow_mut().resize(len, Value::Undefined);
                } else if let Some(index) = builtins::array_index(key) {
                    let mut items = items.borrow_mut();
                    if index >= items.len() {
                        let len = index.checked_add(1).ok_or(ScriptError::CollectionTooLarge {
                            requested: index,
                            limit: self.limits.max_collection_len,
                        })?;
                        self.check_len(len)?;
                        items.resize(len, Value::Undefined);
                    }
                    items[index] = value;
                }
                Ok(())
            }
            Value::Undefined | Value::Null => Err(ScriptError::type_error(format!(
                "Cannot set properties of {} (setting '{key}')",
                target.to_display_string()
            ))),
            // Primitive wrappers silently drop writes.
            _ => Ok(()),
        }
    }

    fn binary(&self, op: BinaryOp, left: &Value, right: &Value) -> Result<Value, ScriptError> {
        let number = |f: fn(f64, f64) -> f64| Value::Number(f(left.to_number(), right.to_number()));
        Ok(match op {
            BinaryOp::Add => {
                let textual = |v: &Value| matches!(v, Value::Str(_) | Value::Array(_) | Value::Object(_));
                if textual(left) || textual(right) {
                    let mut out = self.stringify(left)?;
                    out.push_str(&self.stringify(right)?);
                    self.check_len(out.len())?;
                    Value::str(&out)
                } else {
                    number(|a, b| a + b)
                }
            }
            BinaryOp::Sub => number(|a, b| a - b),
            BinaryOp::Mul => number(|a, b| a * b),
            BinaryOp::Div => number(|a, b| a / b),
            BinaryOp::Rem => number(|a, b| a % b),
            BinaryOp::Pow => number(f64::powf),
            BinaryOp::Lt => Value::Bool(compare(left, right) == Some(Ordering::Less)),
            BinaryOp::Gt => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
            BinaryOp::LtEq => {
                Value::Bool(matches!(compare(left, right), Some(Ordering::Less | Ordering::Equal)))
            }
            BinaryOp::GtEq => {
                Value::Bool(matches!(compare(left, right), Some(Ordering::Greater | Ordering::Equal)))
            }
            BinaryOp::Eq => Value::Bool(left.loose_equals(right)),
            BinaryOp::NotEq => Value::Bool(!left.loose_equals(right)),
            BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
            BinaryOp::StrictNotEq => Value::Bool(!left.strict_equals(right)),
            BinaryOp::In => {
                let key = property_key(left);
                match right {
                    Value::Object(object) => Value::Bool(object.borrow().contains(&key)),
                    Value::Array(items) => Value::Bool(
                        key == "length"
                            || builtins::array_index(&key).is_some_and(|i| i < items.borrow().len()),
                    ),
                    other => {
                        return Err(ScriptError::type_error(format!(
                            "Cannot use 'in' operator to search for '{key}' in {}",
                            other.to_display_string()
                        )))
                    }
                }
            }
        })
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        for scope in self.scopes.drain(..) {
            scope.vars.into_values().for_each(|binding| release(binding.value));
        }
        if let Some(thrown) = self.thrown.take() {
            release(thrown);
        }
    }
}

/// Relational comparison: strings compare lexically, everything else numerically.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

/// Converts an index or computed key to the property name it addresses.
pub(crate) fn property_key(value: &Value) -> String {
    match value {
        Value::Number(n) => format_number(*n),
        other => other.to_display_string(),
    }
}

/// Short source-like description of a callee for error messages.
fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Member { object, property } => format!("{}.{property}", describe(object)),
        Expr::Index { object, .. } => format!("{}[...]", describe(object)),
        Expr::Call { callee, .. } => format!("{}(...)", describe(callee)),
        _ => "expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parse;

    fn run(source: &str) -> Result<Interpreter, ScriptError> {
        let program = parse(source)?;
        let mut interpreter = Interpreter::new(ScriptSettings::default());
        interpreter.run(&program)?;
        Ok(interpreter)
    }

    fn number(interpreter: &Interpreter, name: &str) -> f64 {
        match interpreter.global(name) {
            Some(Value::Number(n)) => n,
            other => panic!("expected number for {name}, got {other:?}"),
        }
    }

    fn string(interpreter: &Interpreter, name: &str) -> String {
        match interpreter.global(name) {
            Some(Value::Str(s)) => s.to_string(),
            other => panic!("expected string for {name}, got {other:?}"),
        }
    }

    #[test]
    fn functions_are_hoisted() {
        let interp = run("var r = twice(4); function twice(x) { return x * 2; }").expect("run");
        assert_eq!(number(&interp, "r"), 8.0);
    }

    #[test]
    fn closures_capture_their_scope() {
        let interp = run(
            "function counter() { let n = 0; return () => ++n; }\n\
             const next = counter(); next(); next(); var c = next();",
        )
        .expect("run");
        assert_eq!(number(&interp, "c"), 3.0);
    }

    #[test]
    fn loops_break_and_continue() {
        let interp = run(
            "var sum = 0;\n\
             for (var i = 0; i < 10; i++) { if (i % 2) continue; if (i > 6) break; sum += i; }\n\
             var j = 0; while (true) { j++; if (j == 5) break; }\n\
             var k = 0; do { k += 3 } while (k < 10)",
        )
        .expect("run");
        assert_eq!(number(&interp, "sum"), 12.0);
        assert_eq!(number(&interp, "j"), 5.0);
        assert_eq!(number(&interp, "k"), 12.0);
    }

    #[test]
    fn for_of_and_for_in_walk_collections() {
        let interp = run(
            "var text = ''; for (const cell of ['a', 'b']) text += cell;\n\
             var keys = ''; for (const k in { x: 1, y: 2 }) keys += k;",
        )
        .expect("run");
        assert_eq!(string(&interp, "text"), "ab");
        assert_eq!(string(&interp, "keys"), "xy");
    }

    #[test]
    fn thrown_values_are_caught() {
        let interp = run(
            "var seen; var done = false;\n\
             try { throw { code: 7 }; } catch (e) { seen = e.code; } finally { done = true; }\n\
             var message; try { missing(); } catch (e) { message = e.name; }",
        )
        .expect("run");
        assert_eq!(number(&interp, "seen"), 7.0);
        assert!(matches!(interp.global("done"), Some(Value::Bool(true))));
        assert_eq!(string(&interp, "message"), "ReferenceError");
    }

    #[test]
    fn step_budget_is_not_catchable() {
        let program = parse("try { while (true) {} } catch (e) {}").expect("parse");
        let limits = ScriptSettings { step_budget: 500, ..ScriptSettings::default() };
        let mut interpreter = Interpreter::new(limits);
        let err = interpreter.run(&program).unwrap_err();
        assert_eq!(err, ScriptError::StepBudgetExhausted { budget: 500 });
    }

    #[test]
    fn recursion_depth_is_limited() {
        let program = parse("function f(n) { return f(n + 1); } f(0);").expect("parse");
        let limits = ScriptSettings { max_call_depth: 16, ..ScriptSettings::default() };
        let err = Interpreter::new(limits).run(&program).unwrap_err();
        assert_eq!(err, ScriptError::CallDepthExceeded { limit: 16 });
    }

    #[test]
    fn huge_arrays_are_rejected() {
        let err = run("var a = new Array(1e9);").unwrap_err();
        assert!(matches!(err, ScriptError::CollectionTooLarge { .. }), "got {err:?}");
    }

    /// Runs `check` on a thread with room for the deepest evaluation the
    /// limits allow, so the limits are what stop the script.
    fn with_deep_stack(check: impl FnOnce() + Send + 'static) {
        std::thread::Builder::new()
            .stack_size(64 << 20)
            .spawn(check)
            .expect("spawn")
            .join()
            .expect("check passed");
    }

    #[test]
    fn cyclic_values_concatenate() {
        let interp = run("var a = []; a.push(a, 1); var s = a + '|' + `${a}`;").expect("run");
        assert_eq!(string(&interp, "s"), ",1|,1");
    }

    #[test]
    fn evaluation_depth_is_limited() {
        with_deep_stack(|| {
            let program =
                parse("function f(n) { if (true) { return [[f(n + 1)]]; } } f(0);").expect("parse");
            let limits = ScriptSettings { max_call_depth: MAX_CALL_DEPTH, ..ScriptSettings::default() };
            let err = Interpreter::new(limits).run(&program).unwrap_err();
            assert_eq!(err, ScriptError::NestingTooDeep { limit: MAX_EVAL_DEPTH });
            assert!(!err.is_catchable());
        });
    }

    #[test]
    fn configured_call_depth_is_capped() {
        with_deep_stack(|| {
            let program = parse("function down(n) { return down(n + 1); } down(0);").expect("parse");
            let limits = ScriptSettings { max_call_depth: 1_000_000, ..ScriptSettings::default() };
            let err = Interpreter::new(limits).run(&program).unwrap_err();
            assert_eq!(err, ScriptError::CallDepthExceeded { limit: MAX_CALL_DEPTH });
        });
    }

    #[test]
    fn deeply_nested_values_are_dropped() {
        let program = parse(
            "var a = []; for (var i = 0; i < 50000; i++) { a = [a]; }\n\
             var b = a; a = null;",
        )
        .expect("parse");
        let limits = ScriptSettings { step_budget: 5_000_000, ..ScriptSettings::default() };
        let mut interpreter = Interpreter::new(limits);
        interpreter.run(&program).expect("run");
        drop(interpreter);
    }

    #[test]
    fn const_rebinding_is_a_type_error() {
        let err = run("const a = 1; a = 2;").unwrap_err();
        assert!(matches!(err, ScriptError::Type { .. }), "got {err:?}");
    }

    #[test]
    fn typeof_tolerates_undeclared_names() {
        let interp = run("var t = typeof nothingHere;").expect("run");
        assert_eq!(string(&interp, "t"), "undefined");
    }

    #[test]
    fn undeclared_assignment_creates_global() {
        let interp = run("function f() { leaked = 5; } f();").expect("run");
        assert_eq!(number(&interp, "leaked"), 5.0);
    }

    #[test]
    fn arithmetic_and_coercion() {
        let interp = run(
            "var a = '3' * 2; var b = 1 + '2'; var c = 2 ** 10; var d = -7 % 3;\n\
             var e = null ?? 'fallback'; var f = 0 || 9; var g = `x${1 + 1}y`;",
        )
        .expect("run");
        assert_eq!(number(&interp, "a"), 6.0);
        assert_eq!(string(&interp, "b"), "12");
        assert_eq!(number(&interp, "c"), 1024.0);
        assert_eq!(number(&interp, "d"), -1.0);
        assert_eq!(string(&interp, "e"), "fallback");
        assert_eq!(number(&interp, "f"), 9.0);
        assert_eq!(string(&interp, "g"), "x2y");
    }
}
