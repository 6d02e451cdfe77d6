//! SVM CLI - pack, unpack and inspect SVM animations.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use svm_anim::{
    Animation, EncoderConfig, PackManifest, Palette,
    container::{SvmHeader, encode_with_stats},
    decode,
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("--example") => print_example_manifest(),
        Some("pack") if args.len() == 4 => pack(Path::new(&args[2]), Path::new(&args[3])),
        Some("unpack") if args.len() == 4 => unpack(Path::new(&args[2]), Path::new(&args[3])),
        Some("info") if args.len() >= 3 => info(&args[2..]),
        _ => {
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage:");
    eprintln!("  {} pack <manifest.json> <out.svm>", program);
    eprintln!("  {} unpack <in.svm> <out_dir>", program);
    eprintln!("  {} info <in.svm>...", program);
    eprintln!("  {} --example", program);
    eprintln!();
    eprintln!("pack encodes raw palette-index buffers listed in a JSON manifest.");
    eprintln!("unpack writes the frames, palette and a manifest that pack can read back.");
}

/// Print `context: err` and exit.
fn fail(context: impl Display, err: impl Display) -> ! {
    eprintln!("Error {}: {}", context, err);
    std::process::exit(1);
}

fn pack(manifest_path: &Path, output: &Path) {
    let manifest_str = fs::read_to_string(manifest_path)
        .unwrap_or_else(|e| fail("reading manifest", e));

    let mut manifest: PackManifest =
        serde_json::from_str(&manifest_str).unwrap_or_else(|e| fail("parsing manifest", e));
    manifest
        .validate()
        .unwrap_or_else(|e| fail("validating manifest", e));

    if let Some(base) = manifest_path.parent() {
        manifest.resolve_paths(base);
    }

    let palette_bytes = fs::read(&manifest.palette)
        .unwrap_or_else(|e| fail(format!("reading {}", manifest.palette.display()), e));
    if palette_bytes.len() > Palette::SIZE {
        log::warn!(
            "palette file has {} bytes, only the first {} are used",
            palette_bytes.len(),
            Palette::SIZE
        );
    }

    let frames: Vec<Vec<u8>> = manifest
        .frames
        .iter()
        .map(|path| {
            fs::read(path).unwrap_or_else(|e| fail(format!("reading {}", path.display()), e))
        })
        .collect();

    let animation = Animation {
        width: manifest.width as u16,
        height: manifest.height as u16,
        delay_ms: manifest.encoder.delay_ms,
        palette: Palette::from_bytes(&palette_bytes),
        frames,
    };

    let (bytes, stats) = encode_with_stats(&animation, &manifest.encoder)
        .unwrap_or_else(|e| fail("encoding", e));
    fs::write(output, bytes).unwrap_or_else(|e| fail(format!("writing {}", output.display()), e));

    println!("Wrote {}: {}", output.display(), stats);
}

fn unpack(input: &Path, out_dir: &Path) {
    let animation = Animation::read_from_path(input)
        .unwrap_or_else(|e| fail(format!("decoding {}", input.display()), e));

    fs::create_dir_all(out_dir)
        .unwrap_or_else(|e| fail(format!("creating {}", out_dir.display()), e));

    let write = |name: &Path, data: &[u8]| {
        let path = out_dir.join(name);
        fs::write(&path, data).unwrap_or_else(|e| fail(format!("writing {}", path.display()), e));
    };

    let palette = PathBuf::from("palette.rgb");
    write(palette.as_path(), animation.palette.to_bytes().as_slice());

    let mut frames = Vec::with_capacity(animation.frames.len());
    for (i, frame) in animation.frames.iter().enumerate() {
        let name = PathBuf::from(format!("frame_{:03}.idx", i));
        write(name.as_path(), frame.as_slice());
        frames.push(name);
    }

    let manifest = PackManifest {
        width: animation.width as u32,
        height: animation.height as u32,
        palette,
        frames,
        encoder: EncoderConfig {
            delay_ms: animation.delay_ms,
            ..Default::default()
        },
    };
    let json = serde_json::to_string_pretty(&manifest)
        .unwrap_or_else(|e| fail("serializing manifest", e));
    write(Path::new("manifest.json"), json.as_bytes());

    println!(
        "Unpacked {} frames ({}x{}) into {}",
        animation.frames.len(),
        animation.width,
        animation.height,
        out_dir.display()
    );
}

fn info(paths: &[String]) {
    // Each file decodes on its own, so files are independent units of work.
    let results: Vec<_> = paths
        .par_iter()
        .map(|path| {
            let bytes = fs::read(path).map_err(|e| e.to_string())?;
            let animation = decode(&bytes).map_err(|e| e.to_string())?;
            Ok::<_, String>((bytes.len(), animation))
        })
        .collect();

    let mut failed = false;
    for (path, result) in paths.iter().zip(results) {
        println!("{}", path);
        match result {
            Ok((file_bytes, animation)) => print_animation_info(file_bytes, &animation),
            Err(e) => {
                println!("  Error: {}", e);
                failed = true;
            }
        }
        println!();
    }

    if failed {
        std::process::exit(1);
    }
}

fn print_animation_info(file_bytes: usize, animation: &Animation) {
    let mut used = [false; 256];
    for frame in &animation.frames {
        for &index in frame {
            used[index as usize] = true;
        }
    }
    let colors = used.iter().filter(|&&u| u).count();
    let raw_bytes = animation.frame_len() * animation.frames.len();

    println!("  Size: {}x{}", animation.width, animation.height);
    println!("  Frames: {}", animation.frames.len());
    println!(
        "  Delay: {} ms ({} ms per loop)",
        animation.delay_ms,
        animation.duration_ms()
    );
    println!("  Palette entries used: {}", colors);
    println!(
        "  File: {} bytes ({} header + palette), {:.1}% of {} raw index bytes",
        file_bytes,
        SvmHeader::PAYLOAD_OFFSET,
        file_bytes as f64 / raw_bytes.max(1) as f64 * 100.0,
        raw_bytes
    );
}

fn print_example_manifest() {
    let manifest = PackManifest::default();

    println!("Example manifest (manifest.json):");
    println!(
        "{}",
        serde_json::to_string_pretty(&manifest).unwrap_or_else(|e| fail("serializing", e))
    );
}
