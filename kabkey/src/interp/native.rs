//! Host-provided functions
//!
//! A native receives the calling environment, the evaluated arguments and an
//! output sink. It checks its own arity and argument types and reports
//! violations as position-less [`RuntimeError`]s.

use super::env::{EnvRef, Environment};
use super::error::RuntimeError;
use super::value::{Function, NativeFunction, Value};
use std::io::Write;
use std::rc::Rc;

/// `Ok(None)` means the call produced no value
pub type NativeResult = Result<Option<Value>, RuntimeError>;

/// Native function signature
pub type NativeFn = fn(&mut CallContext<'_>, &[Value]) -> NativeResult;

/// What a native function can see of the interpreter
pub struct CallContext<'a> {
    pub env: &'a EnvRef,
    pub out: &'a mut dyn Write,
}

/// Every native, in registration order
pub const NATIVES: &[NativeFunction] = &[
    NativeFunction { name: "print", func: native_print },
    NativeFunction { name: "println", func: native_println },
    NativeFunction { name: "len", func: native_len },
    NativeFunction { name: "printf", func: native_printf },
    NativeFunction { name: "inspect", func: native_inspect },
    NativeFunction { name: "type", func: native_type },
];

/// Bind every native in `env`
pub fn register(env: &mut Environment) {
    for native in NATIVES {
        env.define(
            native.name.to_string(),
            Value::Function(Rc::new(Function::Native(*native))),
        );
    }
}

fn write_out(ctx: &mut CallContext<'_>, text: &str) -> Result<(), RuntimeError> {
    ctx.out
        .write_all(text.as_bytes())
        .and_then(|()| ctx.out.flush())
        .map_err(|e| RuntimeError::native(format!("write failed: {e}")))
}

fn display_all(args: &[Value]) -> String {
    args.iter().map(Value::to_string).collect()
}

fn native_print(ctx: &mut CallContext<'_>, args: &[Value]) -> NativeResult {
    let text = display_all(args);
    write_out(ctx, &text)?;
    Ok(None)
}

fn native_println(ctx: &mut CallContext<'_>, args: &[Value]) -> NativeResult {
    let mut text = display_all(args);
    text.push('\n');
    write_out(ctx, &text)?;
    Ok(None)
}

fn native_len(_ctx: &mut CallContext<'_>, args: &[Value]) -> NativeResult {
    match args {
        [] => Err(RuntimeError::native("missing parameter in call to 'len'")),
        [Value::String(s)] => Ok(Some(Value::Integer(s.chars().count() as i64))),
        [other] => Err(RuntimeError::native(format!(
            "type {} not supported for 'len'",
            other.type_name()
        ))),
        _ => Err(RuntimeError::native("too many parameters in call to 'len'")),
    }
}

fn native_printf(ctx: &mut CallContext<'_>, args: &[Value]) -> NativeResult {
    let Some((first, rest)) = args.split_first() else {
        return Err(RuntimeError::native("missing parameter in call to 'printf'"));
    };
    let Value::String(template) = first else {
        return Err(RuntimeError::native(format!(
            "first parameter to 'printf' must be STRING, got {}",
            first.type_name()
        )));
    };
    if let Some(bad) = rest
        .iter()
        .find(|v| !matches!(v, Value::Integer(_) | Value::String(_) | Value::Boolean(_)))
    {
        return Err(RuntimeError::native(format!(
            "invalid parameter to 'printf': type {} not supported",
            bad.type_name()
        )));
    }

    let text = format_template(&unescape(template), rest);
    write_out(ctx, &text)?;
    Ok(None)
}

fn native_inspect(_ctx: &mut CallContext<'_>, args: &[Value]) -> NativeResult {
    let [value] = args else {
        return Err(wrong_count("inspect", args.len()));
    };
    Ok(Some(Value::from(value.to_string())))
}

fn native_type(_ctx: &mut CallContext<'_>, args: &[Value]) -> NativeResult {
    let [value] = args else {
        return Err(wrong_count("type", args.len()));
    };
    Ok(Some(Value::from(value.type_name())))
}

fn wrong_count(name: &str, got: usize) -> RuntimeError {
    RuntimeError::native(format!(
        "incorrect number of parameters to '{name}': expected 1, got {got}"
    ))
}

/// Interpret `\n`, `\t` and `\\`; any other escape is kept with its backslash
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Expand `%d %s %t %v %%` against `args`.
///
/// A verb whose argument has the wrong type renders as `%!<verb>(<TYPE>=<value>)`,
/// a verb with no argument left as `%!<verb>(MISSING)`. Unknown verbs are
/// copied through and leftover arguments are ignored.
pub fn format_template(template: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(&verb) = chars.peek() else {
            out.push('%');
            break;
        };
        if !matches!(verb, 'd' | 's' | 't' | 'v' | '%') {
            out.push('%');
            continue;
        }
        chars.next();
        if verb == '%' {
            out.push('%');
            continue;
        }
        match (verb, args.next()) {
            (_, None) => out.push_str(&format!("%!{verb}(MISSING)")),
            ('d', Some(Value::Integer(n))) => out.push_str(&n.to_string()),
            ('s', Some(Value::String(s))) => out.push_str(s),
            ('t', Some(Value::Boolean(b))) => out.push_str(&b.to_string()),
            ('v', Some(value)) => out.push_str(&value.to_string()),
            (_, Some(value)) => {
                out.push_str(&format!("%!{verb}({}={value})", value.type_name()))
            }
        }
    }
    out
}
