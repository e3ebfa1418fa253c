use std::env;
use std::path::PathBuf;

use prost::Message as _;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/blog.proto");

    // protox compiles the definitions in pure Rust, no protoc needed
    let file_descriptors = protox::compile(["proto/blog.proto"], ["proto"])?;
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    std::fs::write(
        out_dir.join("blog_descriptor.bin"),
        file_descriptors.encode_to_vec(),
    )?;

    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .compile_fds(file_descriptors)?;
    Ok(())
}
