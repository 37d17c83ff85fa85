// build.rs
// Compiles the GLSL stages under resources/shaders into SPIR-V with glslc

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

const SHADER_DIR: &str = "../../resources/shaders";
const OUTPUT_DIR: &str = "../../target/shaders";

fn main() {
    println!("cargo:rerun-if-changed={SHADER_DIR}");
    println!("cargo:rerun-if-env-changed=SKIP_SHADERS");
    println!("cargo:rerun-if-env-changed=VULKAN_SDK");

    if env::var_os("SKIP_SHADERS").is_some() {
        eprintln!("info: SKIP_SHADERS set, using prebuilt SPIR-V");
        return;
    }

    let Ok(vulkan_sdk) = env::var("VULKAN_SDK") else {
        eprintln!("warning: VULKAN_SDK not set, shader compilation skipped");
        eprintln!("hint: install the Vulkan SDK or enable the runtime-glsl feature");
        return;
    };

    let glslc = if cfg!(target_os = "windows") {
        PathBuf::from(&vulkan_sdk).join("Bin").join("glslc.exe")
    } else {
        PathBuf::from(&vulkan_sdk).join("bin").join("glslc")
    };

    if !glslc.exists() {
        panic!("glslc not found at {}", glslc.display());
    }

    let shader_dir = Path::new(SHADER_DIR);
    let output_dir = Path::new(OUTPUT_DIR);
    if let Err(e) = std::fs::create_dir_all(output_dir) {
        eprintln!("warning: cannot create {}: {e}", output_dir.display());
        return;
    }

    let entries = match std::fs::read_dir(shader_dir) {
        Ok(entries) => entries,
        Err(_) => {
            eprintln!("info: no shader directory at {}", shader_dir.display());
            return;
        }
    };

    let mut compiled = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_stage = path
            .extension()
            .is_some_and(|ext| ext == "vert" || ext == "frag");
        if !is_stage {
            continue;
        }

        // sphere.vert -> sphere.vert.spv keeps both stages of a program apart
        let Some(file_name) = path.file_name() else { continue };
        let mut out_name = file_name.to_os_string();
        out_name.push(".spv");
        let out_file = output_dir.join(out_name);

        if is_up_to_date(&path, &out_file) {
            continue;
        }

        let status = Command::new(&glslc)
            .arg(&path)
            .arg("-o")
            .arg(&out_file)
            .status();

        match status {
            Ok(s) if s.success() => compiled += 1,
            Ok(s) => panic!(
                "glslc failed for {} with exit code {}",
                path.display(),
                s.code().unwrap_or(-1)
            ),
            Err(e) => panic!("failed to run glslc for {}: {e}", path.display()),
        }
    }

    eprintln!("info: compiled {compiled} shader stage(s)");
}

fn is_up_to_date(source: &Path, output: &Path) -> bool {
    let modified = |p: &Path| std::fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(source), modified(output)) {
        (Some(src), Some(dst)) => dst >= src,
        _ => false,
    }
}
