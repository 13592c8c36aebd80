// src/script/value.rs

//! Runtime values manipulated by the script interpreter.

use super::ast::FunctionDef;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Index of a scope inside the interpreter's scope arena.
pub(crate) type ScopeId = usize;

/// A script value.
///
/// Composite values (`Array`, `Object`) are reference types shared through
/// `Rc<RefCell<..>>`, so a function that mutates its board argument mutates the
/// caller's board as well.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<Object>>),
    Function(Rc<Closure>),
    Native(Native),
}

/// Property bag that remembers insertion order.
#[derive(Debug, Clone, Default)]
pub struct Object {
    entries: Vec<(String, Value)>,
}

impl Object {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Overwrites an existing property in place or appends a new one.
    pub(crate) fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub(crate) fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn into_values(self) -> impl Iterator<Item = Value> {
        self.entries.into_iter().map(|(_, v)| v)
    }
}

/// Drops a value without recursing, so arbitrarily deep arrays and objects
/// cannot exhaust the native stack. Containers still shared elsewhere are only
/// released by their last owner.
pub(crate) fn release(value: Value) {
    if !matches!(value, Value::Array(_) | Value::Object(_)) {
        return;
    }
    let mut pending = vec![value];
    while let Some(value) = pending.pop() {
        match value {
            Value::Array(items) => {
                if let Ok(items) = Rc::try_unwrap(items) {
                    pending.extend(items.into_inner());
                }
            }
            Value::Object(object) => {
                if let Ok(object) = Rc::try_unwrap(object) {
                    pending.extend(object.into_inner().into_values());
                }
            }
            _ => {}
        }
    }
}

/// A script-defined function together with the scope it closes over.
#[derive(Debug)]
pub struct Closure {
    pub(crate) def: Rc<FunctionDef>,
    pub(crate) scope: ScopeId,
}

impl Closure {
    pub fn name(&self) -> Option<&str> {
        self.def.name.as_deref()
    }

    pub fn arity(&self) -> usize {
        self.def.params.len()
    }
}

/// Console channel a `console.*` call writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Log,
    Warn,
    Error,
}

/// Host-provided functions.
#[derive(Debug, Clone)]
pub enum Native {
    ArrayCtor,
    ErrorCtor,
    ObjectKeys,
    ObjectValues,
    ObjectEntries,
    MathAbs,
    MathMin,
    MathMax,
    MathFloor,
    MathCeil,
    MathRound,
    MathSqrt,
    MathPow,
    MathRandom,
    StringCtor,
    NumberCtor,
    ParseInt,
    ParseFloat,
    IsNaN,
    Console(ConsoleLevel),
    /// A method read off a receiver, e.g. `board.indexOf`.
    Bound(Rc<BoundMethod>),
}

#[derive(Debug)]
pub struct BoundMethod {
    pub(crate) receiver: Value,
    pub(crate) name: Rc<str>,
}

impl PartialEq for Native {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Native::Bound(a), Native::Bound(b)) => Rc::ptr_eq(a, b),
            (Native::Console(a), Native::Console(b)) => a == b,
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl Native {
    pub(crate) fn name(&self) -> &str {
        match self {
            Native::ArrayCtor => "Array",
            Native::ErrorCtor => "Error",
            Native::ObjectKeys => "keys",
            Native::ObjectValues => "values",
            Native::ObjectEntries => "entries",
            Native::MathAbs => "abs",
            Native::MathMin => "min",
            Native::MathMax => "max",
            Native::MathFloor => "floor",
            Native::MathCeil => "ceil",
            Native::MathRound => "round",
            Native::MathSqrt => "sqrt",
            Native::MathPow => "pow",
            Native::MathRandom => "random",
            Native::StringCtor => "String",
            Native::NumberCtor => "Number",
            Native::ParseInt => "parseInt",
            Native::ParseFloat => "parseFloat",
            Native::IsNaN => "isNaN",
            Native::Console(ConsoleLevel::Log) => "log",
            Native::Console(ConsoleLevel::Warn) => "warn",
            Native::Console(ConsoleLevel::Error) => "error",
            Native::Bound(method) => &method.name,
        }
    }
}

impl Value {
    pub(crate) fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    pub(crate) fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub(crate) fn object(object: Object) -> Self {
        Value::Object(Rc::new(RefCell::new(object)))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }

    /// Result of the `typeof` operator.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Function(_) | Value::Native(_) => "function",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => !(n.is_nan() || *n == 0.0),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Numeric conversion with the usual script coercion rules.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::Str(s) => string_to_number(s),
            Value::Array(_) => string_to_number(&self.to_display_string()),
            Value::Object(_) | Value::Function(_) | Value::Native(_) => f64::NAN,
        }
    }

    /// String conversion as performed by `String(x)` and `+` concatenation.
    ///
    /// A container that contains itself converts to `""` at the point of the
    /// cycle. Output past [`DISPLAY_LIMIT`] bytes or nesting past
    /// [`MAX_DISPLAY_DEPTH`] is cut off; evaluation paths that must not lose
    /// text use [`Value::display_within`] instead.
    pub fn to_display_string(&self) -> String {
        let mut writer = DisplayWriter::new(DISPLAY_LIMIT, DisplayStyle::Plain);
        // Whatever was written before an overflow is kept.
        let _ = writer.write(self);
        writer.out
    }

    /// Like [`Value::to_display_string`] but fails instead of truncating once
    /// the text would exceed `limit` bytes.
    pub(crate) fn display_within(&self, limit: usize) -> Result<String, DisplayOverflow> {
        let mut writer = DisplayWriter::new(limit, DisplayStyle::Plain);
        writer.write(self)?;
        Ok(writer.out)
    }

    fn scalar_display(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.to_string(),
            Value::Function(closure) => {
                format!("function {}() {{ ... }}", closure.name().unwrap_or(""))
            }
            Value::Native(native) => format!("function {}() {{ [native code] }}", native.name()),
            Value::Array(_) | Value::Object(_) => String::new(),
        }
    }

    /// The `===` relation.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a == b,
            _ => false,
        }
    }

    /// Like `===` but treats `NaN` as equal to itself, as `includes` does.
    pub(crate) fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_equals(other),
        }
    }

    /// The `==` relation.
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Number(_), Value::Str(_) | Value::Bool(_))
            | (Value::Str(_) | Value::Bool(_), Value::Number(_))
            | (Value::Bool(_), Value::Str(_))
            | (Value::Str(_), Value::Bool(_)) => self.to_number() == other.to_number(),
            (Value::Array(_) | Value::Object(_), Value::Str(_) | Value::Number(_)) => {
                Value::str(&self.to_display_string()).loose_equals(other)
            }
            (Value::Str(_) | Value::Number(_), Value::Array(_) | Value::Object(_)) => {
                other.loose_equals(self)
            }
            _ => self.strict_equals(other),
        }
    }
}

/// Longest text [`Value::to_display_string`] produces.
pub const DISPLAY_LIMIT: usize = 1 << 20;

/// Deepest container nesting a string conversion walks into.
pub const MAX_DISPLAY_DEPTH: usize = 128;

/// Why a string conversion stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DisplayOverflow {
    /// The text would have grown to this many bytes.
    Length(usize),
    Depth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DisplayStyle {
    /// `String(x)`: arrays join with commas, cycles print as nothing.
    Plain,
    /// Console output: brackets, quoted strings, `[Circular]`.
    Inspect,
}

struct DisplayWriter {
    out: String,
    limit: usize,
    style: DisplayStyle,
    /// Containers currently being written, innermost last.
    open: Vec<*const ()>,
}

impl DisplayWriter {
    fn new(limit: usize, style: DisplayStyle) -> Self {
        Self { out: String::new(), limit, style, open: Vec::new() }
    }

    fn push(&mut self, text: &str) -> Result<(), DisplayOverflow> {
        let len = self.out.len() + text.len();
        if len > self.limit {
            return Err(DisplayOverflow::Length(len));
        }
        self.out.push_str(text);
        Ok(())
    }

    fn write(&mut self, value: &Value) -> Result<(), DisplayOverflow> {
        let id = match value {
            Value::Array(items) => Rc::as_ptr(items).cast::<()>(),
            Value::Object(object) => Rc::as_ptr(object).cast::<()>(),
            other => return self.push(&other.scalar_display()),
        };
        if self.open.contains(&id) {
            return match self.style {
                DisplayStyle::Plain => Ok(()),
                DisplayStyle::Inspect => self.push("[Circular]"),
            };
        }
        if self.open.len() >= MAX_DISPLAY_DEPTH {
            return Err(DisplayOverflow::Depth);
        }
        self.open.push(id);
        let written = match value {
            Value::Array(items) => self.write_array(&items.borrow()),
            Value::Object(object) => self.write_object(&object.borrow()),
            _ => Ok(()),
        };
        self.open.pop();
        written
    }

    fn write_array(&mut self, items: &[Value]) -> Result<(), DisplayOverflow> {
        let inspect = self.style == DisplayStyle::Inspect;
        if inspect {
            self.push("[")?;
        }
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.push(if inspect { ", " } else { "," })?;
            }
            match item {
                Value::Str(s) if inspect => self.push(&format!("{s:?}"))?,
                // `join` leaves holes for `undefined` and `null`.
                item if item.is_nullish() && !inspect => {}
                item => self.write(item)?,
            }
        }
        if inspect {
            self.push("]")?;
        }
        Ok(())
    }

    fn write_object(&mut self, object: &Object) -> Result<(), DisplayOverflow> {
        if self.style == DisplayStyle::Plain {
            // Error-like objects print as "Name: message".
            return match (object.get("name"), object.get("message")) {
                (Some(Value::Str(name)), Some(message)) => {
                    self.push(&format!("{name}: "))?;
                    self.write(message)
                }
                _ => self.push("[object Object]"),
            };
        }
        self.push("{")?;
        for (i, (key, value)) in object.entries().iter().enumerate() {
            self.push(if i > 0 { ", " } else { " " })?;
            self.push(&format!("{key}: "))?;
            match value {
                Value::Str(s) => self.push(&format!("{s:?}"))?,
                other => self.write(other)?,
            }
        }
        if object.len() > 0 {
            self.push(" ")?;
        }
        self.push("}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut writer = DisplayWriter::new(DISPLAY_LIMIT, DisplayStyle::Inspect);
        match writer.write(self) {
            Ok(()) => f.write_str(&writer.out),
            Err(_) => write!(f, "{} ...", writer.out),
        }
    }
}

/// Formats a number the way script string conversion does: integers without a
/// fractional part, `-0` as `0`, and never in exponent notation.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}

/// `Number("...")` conversion: surrounding whitespace is ignored, the empty
/// string is zero and anything that is not a complete numeric literal is NaN.
pub(crate) fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let (sign, unsigned) = match trimmed.as_bytes()[0] {
        b'-' => (-1.0, &trimmed[1..]),
        b'+' => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    if unsigned == "Infinity" {
        return sign * f64::INFINITY;
    }
    if let Some(hex) = unsigned.strip_prefix("0x").or_else(|| unsigned.strip_prefix("0X")) {
        if sign < 0.0 || trimmed.starts_with('+') {
            return f64::NAN;
        }
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |v| v as f64);
    }
    let well_formed = !unsigned.is_empty()
        && unsigned.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        && unsigned.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '.');
    if !well_formed {
        return f64::NAN;
    }
    unsigned.parse::<f64>().map_or(f64::NAN, |v| sign * v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_format_like_script_strings() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1e21), "1000000000000000000000");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn string_conversion_is_strict() {
        assert_eq!(string_to_number("  42 "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("-1.5e2"), -150.0);
        assert_eq!(string_to_number("0x1f"), 31.0);
        assert!(string_to_number("12px").is_nan());
        assert!(string_to_number("inf").is_nan());
    }

    #[test]
    fn equality_relations() {
        let one = Value::Number(1.0);
        assert!(one.loose_equals(&Value::str("1")));
        assert!(!one.strict_equals(&Value::str("1")));
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(!Value::Null.strict_equals(&Value::Undefined));
        let nan = Value::Number(f64::NAN);
        assert!(!nan.strict_equals(&nan));
        assert!(nan.same_value_zero(&nan));
    }

    #[test]
    fn object_keeps_insertion_order() {
        let mut object = Object::new();
        object.set("4", Value::Number(-3.0));
        object.set("0", Value::Number(-2.0));
        object.set("4", Value::Number(-4.0));
        assert_eq!(object.keys().collect::<Vec<_>>(), vec!["4", "0"]);
        assert!(matches!(object.get("4"), Some(Value::Number(n)) if *n == -4.0));
    }

    #[test]
    fn arrays_join_for_display() {
        let board = Value::array(vec![Value::str(""), Value::str("X"), Value::Null]);
        assert_eq!(board.to_display_string(), ",X,");
        assert_eq!(board.to_string(), r#"["", "X", null]"#);
    }

    #[test]
    fn self_containing_array_converts_without_recursing() {
        let items = Rc::new(RefCell::new(vec![Value::Number(1.0)]));
        let array = Value::Array(Rc::clone(&items));
        items.borrow_mut().push(array.clone());
        assert_eq!(array.to_display_string(), "1,");
        assert_eq!(array.to_string(), "[1, [Circular]]");

        let mut object = Object::new();
        object.set("name", Value::str("Error"));
        let error = Value::object(object);
        if let Value::Object(inner) = &error {
            inner.borrow_mut().set("message", error.clone());
        }
        assert_eq!(error.to_display_string(), "Error: ");
    }

    #[test]
    fn deep_values_are_released_iteratively() {
        let mut value = Value::Null;
        for _ in 0..200_000 {
            value = Value::array(vec![value]);
        }
        release(value);
    }

    #[test]
    fn deep_nesting_stops_conversion() {
        let mut value = Value::Number(7.0);
        for _ in 0..MAX_DISPLAY_DEPTH + 1 {
            value = Value::array(vec![value]);
        }
        assert_eq!(value.display_within(DISPLAY_LIMIT), Err(DisplayOverflow::Depth));
        assert_eq!(value.to_display_string(), "");
    }

    #[test]
    fn conversion_is_charged_while_building() {
        let leaf = Value::array(vec![Value::str("abcd"); 4]);
        let doubled = Value::array(vec![leaf.clone(), leaf]);
        assert_eq!(doubled.display_within(100).map(|s| s.len()), Ok(39));
        assert_eq!(doubled.display_within(10), Err(DisplayOverflow::Length(14)));
    }
}
