use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;
use valex::{TypeCast, ValidatorBuilder};

fn main() {
    // RUST_LOG=valex=trace shows every rule outcome.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("valex=debug")),
        )
        .init();

    let validator = ValidatorBuilder::new()
        .rule("multiple_of", &[TypeCast::Int], |v, args, _| {
            let step = args[0].as_i64().unwrap_or(1).max(1);
            Ok(v.as_i64().is_some_and(|n| n % step == 0))
        })
        .macro_def("quantity", "integer & min:0 & multiple_of:5")
        .build();

    println!("{validator}");

    let order = json!({
        "customer": {"email": "ada@example.com", "name": "Ada"},
        "lines": [
            {"sku": "A-1", "qty": 10},
            {"sku": "B-2", "qty": 3},
            {"sku": "", "qty": 15}
        ],
        "note": null
    });

    let report = validator.validate_all(
        &order,
        [
            ("customer.email", "required & email"),
            ("customer.name", "!required & string & between:2,64"),
            ("lines.*.sku", "required & matches:'^[A-Z]-[0-9]+$'"),
            ("lines.*.qty", "[quantity]"),
            ("note", "[nullable] | string & max:280"),
        ],
    );

    println!("{report}");
    for (path, result) in &report {
        match result {
            Ok(result) => println!("  {path}: {result}"),
            Err(e) => println!("  {path}: error: {e}"),
        }
    }

    let single = validator.validate_one(&Value::from("abc"), "string & min:3");
    println!("single value: {single:?}");
}
