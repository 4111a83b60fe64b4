use std::fs;
use std::path::Path;

/// Pull a `#define NAME "value"` string out of the secrets header
fn define_value<'a>(contents: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("#define {}", name);
    contents
        .lines()
        .find(|l| l.split_whitespace().take(2).collect::<Vec<_>>().join(" ") == needle)
        .and_then(|l| l.split('"').nth(1))
}

fn main() -> anyhow::Result<()> {
    // Necessary for ESP-IDF
    embuild::espidf::sysenv::output();

    // Add crash log helper for better panic diagnostics
    println!("cargo:rustc-link-arg=-Wl,--undefined=esp_backtrace_print_app_description");

    // Secrets are compiled in from wifi_config.h, which is never committed
    let secrets_path = "wifi_config.h";
    println!("cargo:rerun-if-changed={}", secrets_path);

    let contents = if Path::new(secrets_path).exists() {
        fs::read_to_string(secrets_path)?
    } else {
        println!("cargo:warning=wifi_config.h not found! Copy wifi_config.h.example to wifi_config.h and add your credentials.");
        String::new()
    };

    for name in ["WIFI_SSID", "WIFI_PASSWORD", "TIBBER_TOKEN"] {
        let value = define_value(&contents, name).unwrap_or_default();
        if value.is_empty() {
            println!("cargo:warning={} not set in wifi_config.h", name);
        }
        println!("cargo:rustc-env={}={}", name, value);
    }

    Ok(())
}
