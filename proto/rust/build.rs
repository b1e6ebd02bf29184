use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    // Tell cargo to rebuild if the proto file changes
    println!("cargo:rerun-if-changed=src/proto/codesearch.proto");

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(out_dir.join("codesearch_descriptor.bin"))
        .compile(&["src/proto/codesearch.proto"], &["src/proto"])?;

    Ok(())
}
