use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use protoc_gen_rust_http_core::generate;
use protoc_gen_rust_http_core::PluginRequest;

const HTTP_TARGET: &str = "example/example.proto";
const HTTP_PARAMETER: &str = "import_prefix=crate,Mshared/search.proto=shared";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let protos = [
        Path::new("tests/proto/example/example.proto"),
        Path::new("tests/proto/example/internal.proto"),
        Path::new("tests/proto/legacy/legacy.proto"),
        Path::new("tests/proto/shared/search.proto"),
    ];
    let include_dir = Path::new("tests/proto");
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let descriptor_set = out_dir.join("descriptor_set.bin");

    let mut config = prost_build::Config::new();
    config
        .file_descriptor_set_path(&descriptor_set)
        .type_attribute(".", "#[derive(serde::Serialize, serde::Deserialize)]");
    tonic_build::configure()
        .build_client(false)
        .out_dir(&out_dir)
        .compile_protos_with_config(config, &protos, &[include_dir])?;

    // http adapters of the example package, without and with request context
    let bytes = fs::read(&descriptor_set)?;
    for (dir, parameter) in [
        ("http", HTTP_PARAMETER.to_string()),
        ("http_context", format!("{},request_context", HTTP_PARAMETER)),
    ] {
        let request =
            PluginRequest::from_descriptor_set(&bytes, vec![HTTP_TARGET.to_string()], parameter)?;
        for file in generate(&request)? {
            let path = out_dir.join(dir).join(file.name());
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, file.content())?;
        }
    }

    println!("cargo:rerun-if-changed=tests/proto");
    println!("cargo:rerun-if-changed=../protoc-gen-rust-http-core/src");
    Ok(())
}
