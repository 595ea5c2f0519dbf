fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = prost_build::Config::new();
    // Amount is two integers; let callers copy it around freely.
    config.type_attribute(".grpcoin.Amount", "#[derive(Copy)]");

    tonic_build::configure()
        .build_server(true)
        .compile_with_config(config, &["proto/grpcoin.proto"], &["proto/"])?;
    println!("cargo:rerun-if-changed=proto/grpcoin.proto");
    Ok(())
}
