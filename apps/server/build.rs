use dotenvy::dotenv_iter;

/// Bake values from a local `.env` into the binary as compile-time defaults
fn main() {
    println!("cargo:rerun-if-changed=.env");

    let Ok(entries) = dotenv_iter() else {
        return;
    };

    for (k, v) in entries.flatten() {
        println!("cargo:rustc-env={k}={v}");
    }
}
