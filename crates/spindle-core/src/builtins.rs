//! Builtin functions callable from expressions.
//!
//! The library is deliberately tiny: `random(min, max)` is the only entry.
//! Arguments are checked strictly, no coercion. Arity and type mismatches
//! are fatal VM errors with a formatted message.

use rand::Rng;

use crate::error::RuntimeError;
use crate::value::Value;

/// Dispatch a builtin call by name.
pub fn call<R: Rng>(name: &str, args: &[Value], rng: &mut R) -> Result<Value, RuntimeError> {
    match name {
        "random" => random(args, rng),
        _ => Err(RuntimeError::UnknownFunction(name.to_string())),
    }
}

/// `random(min, max)`: uniform integer in `[min, max]` inclusive.
/// Reversed bounds are swapped before sampling.
fn random<R: Rng>(args: &[Value], rng: &mut R) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::WrongArgumentCount {
            name: "random".to_string(),
            expected: 2,
            got: args.len(),
        });
    }
    let (mut min, mut max) = match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => (*a, *b),
        _ => {
            return Err(RuntimeError::WrongArgumentType {
                name: "random".to_string(),
            })
        }
    };
    if min > max {
        std::mem::swap(&mut min, &mut max);
    }
    Ok(Value::Int(rng.gen_range(min..=max)))
}
