// src/script/builtins.rs

//! Host functions and property access for the script runtime.
//!
//! The global scope of every interpreter holds exactly the values returned by
//! [`globals`]. Methods on arrays, strings and numbers are resolved on property
//! access and come back as bound natives, so `board.indexOf` can be stored and
//! called later like any other function.

use super::error::ScriptError;
use super::interpreter::Interpreter;
use super::value::{
    format_number, string_to_number, BoundMethod, ConsoleLevel, Native, Object, Value,
};
use rand::RngExt;
use std::rc::Rc;
use tracing::{error, info, warn};

const ARRAY_METHODS: &[&str] = &[
    "push", "pop", "fill", "indexOf", "includes", "join", "slice", "concat", "map", "filter",
    "forEach", "reduce", "some", "every", "find", "findIndex", "reverse",
];

const STRING_METHODS: &[&str] = &[
    "split", "indexOf", "includes", "toUpperCase", "toLowerCase", "trim", "slice", "charAt",
];

const NUMBER_METHODS: &[&str] = &["toFixed", "toString"];

/// Builds the global bindings installed into every fresh interpreter.
pub(crate) fn globals() -> Vec<(&'static str, Value)> {
    let native = |n: Native| Value::Native(n);

    let mut math = Object::new();
    math.set("PI", Value::Number(std::f64::consts::PI));
    for (name, function) in [
        ("abs", Native::MathAbs),
        ("min", Native::MathMin),
        ("max", Native::MathMax),
        ("floor", Native::MathFloor),
        ("ceil", Native::MathCeil),
        ("round", Native::MathRound),
        ("sqrt", Native::MathSqrt),
        ("pow", Native::MathPow),
        ("random", Native::MathRandom),
    ] {
        math.set(name, native(function));
    }

    let mut object = Object::new();
    object.set("keys", native(Native::ObjectKeys));
    object.set("values", native(Native::ObjectValues));
    object.set("entries", native(Native::ObjectEntries));

    let mut console = Object::new();
    console.set("log", native(Native::Console(ConsoleLevel::Log)));
    console.set("warn", native(Native::Console(ConsoleLevel::Warn)));
    console.set("error", native(Native::Console(ConsoleLevel::Error)));

    vec![
        ("Array", native(Native::ArrayCtor)),
        ("Error", native(Native::ErrorCtor)),
        ("Object", Value::object(object)),
        ("Math", Value::object(math)),
        ("String", native(Native::StringCtor)),
        ("Number", native(Native::NumberCtor)),
        ("parseInt", native(Native::ParseInt)),
        ("parseFloat", native(Native::ParseFloat)),
        ("isNaN", native(Native::IsNaN)),
        ("NaN", Value::Number(f64::NAN)),
        ("Infinity", Value::Number(f64::INFINITY)),
        ("console", Value::object(console)),
    ]
}

/// An error object as produced by `new Error(message)`.
pub(crate) fn error_object(name: &str, message: &str) -> Value {
    let mut object = Object::new();
    object.set("name", Value::str(name));
    object.set("message", Value::str(message));
    Value::object(object)
}

/// Largest valid array index; larger numeric keys are ordinary property names.
const MAX_ARRAY_INDEX: u64 = u32::MAX as u64 - 1;

/// Parses a canonical array index (`"0"`, `"12"`, never `"01"`).
pub(crate) fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index: u64 = key.parse().ok()?;
    if index > MAX_ARRAY_INDEX {
        return None;
    }
    usize::try_from(index).ok()
}

/// Validates a requested array length.
pub(crate) fn array_length(n: f64) -> Result<usize, ScriptError> {
    if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 {
        Ok(n as usize)
    } else {
        Err(ScriptError::type_error(format!("Invalid array length {}", format_number(n))))
    }
}

/// Enumerable own keys in iteration order.
pub(crate) fn own_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Object(object) => object.borrow().keys().map(str::to_string).collect(),
        Value::Array(items) => (0..items.borrow().len()).map(|i| i.to_string()).collect(),
        Value::Str(s) => (0..s.chars().count()).map(|i| i.to_string()).collect(),
        _ => Vec::new(),
    }
}

fn bound(receiver: &Value, name: &str) -> Value {
    Value::Native(Native::Bound(Rc::new(BoundMethod {
        receiver: receiver.clone(),
        name: Rc::from(name),
    })))
}

/// Reads `value[key]`.
///
/// # Errors
/// `ScriptError::Type` when reading from `undefined` or `null`.
pub(crate) fn get_property(value: &Value, key: &str) -> Result<Value, ScriptError> {
    let found = match value {
        Value::Undefined | Value::Null => {
            return Err(ScriptError::type_error(format!(
                "Cannot read properties of {} (reading '{key}')",
                value.to_display_string()
            )));
        }
        Value::Array(items) => {
            if key == "length" {
                Value::Number(items.borrow().len() as f64)
            } else if let Some(index) = array_index(key) {
                items.borrow().get(index).cloned().unwrap_or_default()
            } else if ARRAY_METHODS.contains(&key) {
                bound(value, key)
            } else {
                Value::Undefined
            }
        }
        Value::Str(s) => {
            if key == "length" {
                Value::Number(s.chars().count() as f64)
            } else if let Some(index) = array_index(key) {
                s.chars()
                    .nth(index)
                    .map(|c| Value::str(c.encode_utf8(&mut [0; 4])))
                    .unwrap_or_default()
            } else if STRING_METHODS.contains(&key) {
                bound(value, key)
            } else {
                Value::Undefined
            }
        }
        Value::Number(_) if NUMBER_METHODS.contains(&key) => bound(value, key),
        Value::Object(object) => object.borrow().get(key).cloned().unwrap_or_default(),
        Value::Function(closure) => match key {
            "name" => Value::str(closure.name().unwrap_or("")),
            "length" => Value::Number(closure.arity() as f64),
            _ => Value::Undefined,
        },
        Value::Native(native) if key == "name" => Value::str(native.name()),
        _ => Value::Undefined,
    };
    Ok(found)
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// Resolves a relative `slice`-style index against `len`.
fn relative_index(value: &Value, len: usize, default: usize) -> usize {
    if matches!(value, Value::Undefined) {
        return default;
    }
    let n = value.to_number();
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

/// Invokes a host function.
pub(crate) fn call_native(
    interp: &mut Interpreter,
    native: &Native,
    args: Vec<Value>,
) -> Result<Value, ScriptError> {
    let first = arg(&args, 0);
    let unary_math = |f: fn(f64) -> f64| -> Result<Value, ScriptError> {
        Ok(Value::Number(f(first.to_number())))
    };
    match native {
        Native::ArrayCtor => {
            if let [Value::Number(n)] = args.as_slice() {
                let len = array_length(*n)?;
                interp.check_len(len)?;
                Ok(Value::array(vec![Value::Undefined; len]))
            } else {
                interp.check_len(args.len())?;
                Ok(Value::array(args))
            }
        }
        Native::ErrorCtor => {
            let message = if first.is_nullish() { String::new() } else { first.to_display_string() };
            Ok(error_object("Error", &message))
        }
        Native::ObjectKeys | Native::ObjectValues | Native::ObjectEntries => {
            if first.is_nullish() {
                return Err(ScriptError::type_error("Cannot convert undefined or null to object"));
            }
            let keys = own_keys(&first);
            let mut out = Vec::with_capacity(keys.len());
            for key in keys {
                let entry = match native {
                    Native::ObjectKeys => Value::str(&key),
                    Native::ObjectValues => get_property(&first, &key)?,
                    _ => Value::array(vec![Value::str(&key), get_property(&first, &key)?]),
                };
                out.push(entry);
            }
            Ok(Value::array(out))
        }
        Native::MathAbs => unary_math(f64::abs),
        Native::MathFloor => unary_math(f64::floor),
        Native::MathCeil => unary_math(f64::ceil),
        Native::MathSqrt => unary_math(f64::sqrt),
        Native::MathRound => unary_math(|x| (x + 0.5).floor()),
        Native::MathPow => Ok(Value::Number(first.to_number().powf(arg(&args, 1).to_number()))),
        Native::MathMin | Native::MathMax => {
            let is_min = matches!(native, Native::MathMin);
            let mut acc = if is_min { f64::INFINITY } else { f64::NEG_INFINITY };
            for value in &args {
                let n = value.to_number();
                if n.is_nan() {
                    return Ok(Value::Number(f64::NAN));
                }
                acc = if is_min { acc.min(n) } else { acc.max(n) };
            }
            Ok(Value::Number(acc))
        }
        Native::MathRandom => Ok(Value::Number(interp.rng.random::<f64>())),
        Native::StringCtor => {
            let text = if args.is_empty() { String::new() } else { interp.stringify(&first)? };
            Ok(Value::str(&text))
        }
        Native::NumberCtor => {
            Ok(Value::Number(if args.is_empty() { 0.0 } else { first.to_number() }))
        }
        Native::ParseInt => {
            let radix = arg(&args, 1).to_number();
            let radix = if radix.is_nan() || radix == 0.0 { None } else { Some(radix as u32) };
            Ok(Value::Number(parse_int(&first.to_display_string(), radix)))
        }
        Native::ParseFloat => Ok(Value::Number(parse_float(&first.to_display_string()))),
        Native::IsNaN => Ok(Value::Bool(first.to_number().is_nan())),
        Native::Console(level) => {
            let line = args.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
            match level {
                ConsoleLevel::Log => info!(target: "tacqubo::script", "{line}"),
                ConsoleLevel::Warn => warn!(target: "tacqubo::script", "{line}"),
                ConsoleLevel::Error => error!(target: "tacqubo::script", "{line}"),
            }
            Ok(Value::Undefined)
        }
        Native::Bound(method) => call_method(interp, &method.receiver, &method.name, args),
    }
}

fn call_method(
    interp: &mut Interpreter,
    receiver: &Value,
    name: &str,
    args: Vec<Value>,
) -> Result<Value, ScriptError> {
    match receiver {
        Value::Array(items) => array_method(interp, receiver, items, name, args),
        Value::Str(s) => string_method(interp, s, name, &args),
        Value::Number(n) => number_method(*n, name, &args),
        other => Err(ScriptError::type_error(format!(
            "{}.{name} is not a function",
            other.to_display_string()
        ))),
    }
}

type Items = Rc<std::cell::RefCell<Vec<Value>>>;

fn callback(args: &[Value], method: &str) -> Result<Value, ScriptError> {
    let function = arg(args, 0);
    if function.is_callable() {
        Ok(function)
    } else {
        Err(ScriptError::type_error(format!(
            "{} is not a function (in Array.{method})",
            function.to_display_string()
        )))
    }
}

fn array_method(
    interp: &mut Interpreter,
    receiver: &Value,
    items: &Items,
    name: &str,
    args: Vec<Value>,
) -> Result<Value, ScriptError> {
    let len = items.borrow().len();
    match name {
        "push" => {
            interp.check_len(len + args.len())?;
            let mut items = items.borrow_mut();
            items.extend(args);
            Ok(Value::Number(items.len() as f64))
        }
        "pop" => Ok(items.borrow_mut().pop().unwrap_or_default()),
        "fill" => {
            let value = arg(&args, 0);
            let start = relative_index(&arg(&args, 1), len, 0);
            let end = relative_index(&arg(&args, 2), len, len);
            for slot in items.borrow_mut().iter_mut().take(end).skip(start) {
                *slot = value.clone();
            }
            Ok(receiver.clone())
        }
        "indexOf" => {
            let needle = arg(&args, 0);
            let position = items.borrow().iter().position(|item| item.strict_equals(&needle));
            Ok(Value::Number(position.map_or(-1.0, |p| p as f64)))
        }
        "includes" => {
            let needle = arg(&args, 0);
            Ok(Value::Bool(items.borrow().iter().any(|item| item.same_value_zero(&needle))))
        }
        "join" => {
            let separator = match arg(&args, 0) {
                Value::Undefined => ",".to_string(),
                other => other.to_display_string(),
            };
            // Stringifying the receiver itself keeps cycles and length in check.
            let joined = if separator == "," {
                interp.stringify(receiver)?
            } else {
                let mut joined = String::new();
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        joined.push_str(&separator);
                    }
                    if !item.is_nullish() && !item.strict_equals(receiver) {
                        joined.push_str(&interp.stringify(item)?);
                    }
                    interp.check_len(joined.len())?;
                }
                joined
            };
            Ok(Value::str(&joined))
        }
        "slice" => {
            let start = relative_index(&arg(&args, 0), len, 0);
            let end = relative_index(&arg(&args, 1), len, len);
            let slice = if start < end { items.borrow()[start..end].to_vec() } else { Vec::new() };
            Ok(Value::array(slice))
        }
        "concat" => {
            let mut out = items.borrow().clone();
            for value in args {
                match value {
                    Value::Array(other) => out.extend(other.borrow().iter().cloned()),
                    other => out.push(other),
                }
                interp.check_len(out.len())?;
            }
            Ok(Value::array(out))
        }
        "reverse" => {
            items.borrow_mut().reverse();
            Ok(receiver.clone())
        }
        "reduce" => {
            let function = callback(&args, name)?;
            let mut index = 0;
            let mut acc = match args.get(1) {
                Some(initial) => initial.clone(),
                None => {
                    index = 1;
                    items.borrow().first().cloned().ok_or_else(|| {
                        ScriptError::type_error("Reduce of empty array with no initial value")
                    })?
                }
            };
            loop {
                let Some(item) = items.borrow().get(index).cloned() else {
                    break;
                };
                acc = interp.call(&function, vec![acc, item, Value::Number(index as f64), receiver.clone()])?;
                index += 1;
            }
            Ok(acc)
        }
        "map" | "filter" | "forEach" | "some" | "every" | "find" | "findIndex" => {
            let function = callback(&args, name)?;
            let mut mapped = Vec::new();
            let mut index = 0;
            // Visits at most the original length even if a callback pushes.
            while index < len {
                let Some(item) = items.borrow().get(index).cloned() else {
                    break;
                };
                let result = interp.call(
                    &function,
                    vec![item.clone(), Value::Number(index as f64), receiver.clone()],
                )?;
                match name {
                    "map" => mapped.push(result),
                    "filter" if result.truthy() => mapped.push(item),
                    "some" if result.truthy() => return Ok(Value::Bool(true)),
                    "every" if !result.truthy() => return Ok(Value::Bool(false)),
                    "find" if result.truthy() => return Ok(item),
                    "findIndex" if result.truthy() => return Ok(Value::Number(index as f64)),
                    _ => {}
                }
                index += 1;
            }
            Ok(match name {
                "map" | "filter" => Value::array(mapped),
                "some" => Value::Bool(false),
                "every" => Value::Bool(true),
                "findIndex" => Value::Number(-1.0),
                _ => Value::Undefined,
            })
        }
        _ => Err(ScriptError::type_error(format!("Array.{name} is not a function"))),
    }
}

fn string_method(
    interp: &mut Interpreter,
    s: &str,
    name: &str,
    args: &[Value],
) -> Result<Value, ScriptError> {
    let chars: Vec<char> = s.chars().collect();
    let first = arg(args, 0);
    match name {
        "split" => {
            let parts: Vec<Value> = match &first {
                Value::Undefined => vec![Value::str(s)],
                separator => {
                    let separator = separator.to_display_string();
                    if separator.is_empty() {
                        chars.iter().map(|c| Value::str(c.encode_utf8(&mut [0; 4]))).collect()
                    } else {
                        s.split(separator.as_str()).map(Value::str).collect()
                    }
                }
            };
            interp.check_len(parts.len())?;
            Ok(Value::array(parts))
        }
        "indexOf" => {
            let needle = first.to_display_string();
            let position = s.find(&needle).map(|byte| s[..byte].chars().count());
            Ok(Value::Number(position.map_or(-1.0, |p| p as f64)))
        }
        "includes" => Ok(Value::Bool(s.contains(&first.to_display_string()))),
        "toUpperCase" => Ok(Value::str(&s.to_uppercase())),
        "toLowerCase" => Ok(Value::str(&s.to_lowercase())),
        "trim" => Ok(Value::str(s.trim())),
        "slice" => {
            let start = relative_index(&first, chars.len(), 0);
            let end = relative_index(&arg(args, 1), chars.len(), chars.len());
            let slice: String = if start < end { chars[start..end].iter().collect() } else { String::new() };
            Ok(Value::str(&slice))
        }
        "charAt" => {
            let index = first.to_number();
            let index = if index.is_nan() { 0.0 } else { index.trunc() };
            let c = if index >= 0.0 { chars.get(index as usize) } else { None };
            Ok(c.map_or_else(|| Value::str(""), |c| Value::str(c.encode_utf8(&mut [0; 4]))))
        }
        _ => Err(ScriptError::type_error(format!("String.{name} is not a function"))),
    }
}

fn number_method(n: f64, name: &str, args: &[Value]) -> Result<Value, ScriptError> {
    match name {
        "toFixed" => {
            let digits = arg(args, 0).to_number();
            let digits = if digits.is_nan() { 0.0 } else { digits.trunc() };
            if !(0.0..=100.0).contains(&digits) {
                return Err(ScriptError::type_error("toFixed() digits argument must be between 0 and 100"));
            }
            if !n.is_finite() {
                return Ok(Value::str(&format_number(n)));
            }
            Ok(Value::str(&format!("{:.*}", digits as usize, n)))
        }
        "toString" => {
            let radix = match arg(args, 0) {
                Value::Undefined => 10.0,
                other => other.to_number(),
            };
            if radix == 10.0 {
                return Ok(Value::str(&format_number(n)));
            }
            if !(2.0..=36.0).contains(&radix) || radix.fract() != 0.0 {
                return Err(ScriptError::type_error("toString() radix must be between 2 and 36"));
            }
            Ok(Value::str(&integer_to_radix(n, radix as u32)))
        }
        _ => Err(ScriptError::type_error(format!("Number.{name} is not a function"))),
    }
}

// Non-integral values are truncated; strategy scripts only use this for cell indices.
fn integer_to_radix(n: f64, radix: u32) -> String {
    if !n.is_finite() {
        return format_number(n);
    }
    let negative = n < 0.0;
    let mut value = n.abs().trunc() as u64;
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        let digit = (value % u64::from(radix)) as u32;
        digits.push(char::from_digit(digit, radix).unwrap_or('0'));
        value /= u64::from(radix);
    }
    if negative {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

fn parse_int(text: &str, radix: Option<u32>) -> f64 {
    let trimmed = text.trim_start();
    let (sign, mut rest) = match trimmed.chars().next() {
        Some('-') => (-1.0, &trimmed[1..]),
        Some('+') => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    // Zero means "not given": a 0x prefix then selects base 16.
    let mut radix = radix.unwrap_or(0);
    if matches!(radix, 0 | 16) {
        if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
            rest = hex;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }
    let digits: Vec<u32> = rest.chars().map_while(|c| c.to_digit(radix)).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    sign * digits.iter().fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(*d))
}

fn parse_float(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if trimmed[end..].starts_with("Infinity") {
        return if trimmed.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    let mantissa = &trimmed[digits_start..end];
    if mantissa.is_empty() || mantissa == "." {
        return f64::NAN;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    string_to_number(&trimmed[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScriptSettings;
    use crate::script::parse;

    fn eval(source: &str) -> Value {
        let program = parse(&format!("var result = {source};")).expect("parse");
        let mut interpreter = Interpreter::new(ScriptSettings::default());
        interpreter.run(&program).expect("run");
        interpreter.global("result").unwrap_or_default()
    }

    fn text(source: &str) -> String {
        eval(source).to_display_string()
    }

    #[test]
    fn board_helpers() {
        assert_eq!(text("Array(9).fill('').length"), "9");
        assert_eq!(text("new Array(3).fill(0).join('-')"), "0-0-0");
        assert_eq!(text("['', 'X', ''].indexOf('X')"), "1");
        assert_eq!(text("['', 'X', ''].includes('O')"), "false");
        assert_eq!(text("[1, 2, 3].map(x => x * 2).filter(x => x > 2)"), "4,6");
        assert_eq!(text("[1, 2, 3, 4].slice(-2)"), "3,4");
        assert_eq!(text("[1].concat([2, 3], 4)"), "1,2,3,4");
        assert_eq!(text("[1, 2, 3].reduce((a, b) => a + b, 0)"), "6");
    }

    #[test]
    fn object_helpers_keep_order() {
        assert_eq!(text("Object.keys({ b: 1, a: 2 })"), "b,a");
        assert_eq!(text("Object.values({ b: 1, a: 2 })"), "1,2");
        assert_eq!(text("Object.entries({ k: 'v' })[0]"), "k,v");
    }

    #[test]
    fn number_parsing_and_formatting() {
        assert_eq!(text("parseInt('42px')"), "42");
        assert_eq!(text("parseInt('ff', 16)"), "255");
        assert_eq!(text("parseFloat('3.5e1abc')"), "35");
        assert_eq!(text("isNaN(parseInt('x'))"), "true");
        assert_eq!(text("(2.345).toFixed(1)"), "2.3");
        assert_eq!(text("(255).toString(16)"), "ff");
        assert_eq!(text("Number('7') + 1"), "8");
        assert_eq!(text("String(-0)"), "0");
    }

    #[test]
    fn math_functions() {
        assert_eq!(text("Math.max(1, 5, 3)"), "5");
        assert_eq!(text("Math.min()"), "Infinity");
        assert_eq!(text("Math.round(2.5)"), "3");
        assert_eq!(text("Math.round(-2.5)"), "-2");
        assert_eq!(text("Math.abs(-4) + Math.pow(2, 3)"), "12");
    }

    #[test]
    fn random_is_seeded() {
        let first = eval("Math.random()").to_number();
        let second = eval("Math.random()").to_number();
        assert_eq!(first, second);
        assert!((0.0..1.0).contains(&first));
    }

    #[test]
    fn string_methods() {
        assert_eq!(text("'0,2'.split(',')[1]"), "2");
        assert_eq!(text("'  x '.trim().toUpperCase()"), "X");
        assert_eq!(text("'abc'.indexOf('c')"), "2");
        assert_eq!(text("'abc'.slice(1)"), "bc");
    }

    #[test]
    fn reading_from_undefined_fails() {
        let err = get_property(&Value::Undefined, "x").unwrap_err();
        assert!(err.is_catchable());
    }

    #[test]
    fn array_index_is_canonical() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("12"), Some(12));
        assert_eq!(array_index("01"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index("length"), None);
        assert_eq!(array_index("4294967294"), Some(4_294_967_294));
        assert_eq!(array_index("4294967295"), None);
        assert_eq!(array_index("18446744073709551615"), None);
        assert_eq!(array_index("99999999999999999999999"), None);
    }

    #[test]
    fn cyclic_arrays_join_with_holes() {
        assert_eq!(text("(() => { const a = [1, 2]; a.push(a); return a.join('-'); })()"), "1-2-");
        assert_eq!(text("(() => { const a = [1]; a.push(a); return String(a); })()"), "1,");
    }

    #[test]
    fn oversized_index_keys_do_not_grow_arrays() {
        assert_eq!(text("(() => { const a = []; a['18446744073709551615'] = 1; return a.length; })()"), "0");
        let program = parse("var a = []; a[4294967294] = 1;").expect("parse");
        let err = Interpreter::new(ScriptSettings::default()).run(&program).unwrap_err();
        assert!(matches!(err, ScriptError::CollectionTooLarge { .. }), "got {err:?}");
    }
}
