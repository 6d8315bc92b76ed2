fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/tfplugin6.proto");
    tonic_build::compile_protos("proto/tfplugin6.proto")?;
    Ok(())
}
