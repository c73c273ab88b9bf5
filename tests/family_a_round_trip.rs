//! End-to-end FAMILY-A coverage: build a manifest-driven image, then
//! extract it back and compare against the source bytes.

use std::fs;

use npfw::family_a::{ExtractOptions, build, extract};
use npfw::fstype::FsType;

#[test]
fn build_then_extract_preserves_tag_ver_and_payload_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join("pkg.cfg");

    fs::write(dir.path().join("boot.bin"), b"bootloader-bytes").unwrap();
    fs::write(dir.path().join("rootfs.bin"), vec![0xAAu8; 1500]).unwrap();

    fs::write(
        &manifest_path,
        "[header]\n\
         tag=np1500\n\
         ver=0x00000002\n\
         \n\
         [pkg]\n\
         idx=1\n\
         include=1\n\
         file=boot.bin\n\
         ver=0x1\n\
         dev=/dev/mtd0\n\
         fstype=raw\n\
         \n\
         [pkg]\n\
         idx=2\n\
         include=1\n\
         file=rootfs.bin\n\
         ver=0x5\n\
         dev=/dev/mtd1\n\
         fstype=ubifs\n",
    )
    .unwrap();

    let image_path = dir.path().join("image.bin");
    build(&manifest_path, &image_path).unwrap();

    let out_dir = dir.path().join("extracted");
    let manifest_text = extract(
        &image_path,
        &out_dir,
        ExtractOptions {
            extract_payloads: true,
            verbose: false,
        },
    )
    .unwrap();

    assert!(manifest_text.contains("tag=np1500"));
    assert!(manifest_text.contains("ver=0x00000002"));
    assert!(manifest_text.contains("dev=/dev/mtd0"));
    assert!(manifest_text.contains("dev=/dev/mtd1"));
    assert!(manifest_text.contains("fstype=ubifs"));

    let boot = fs::read(out_dir.join("segment01.bin")).unwrap();
    assert_eq!(boot, b"bootloader-bytes");

    let rootfs = fs::read(out_dir.join("segment02.bin")).unwrap();
    assert_eq!(rootfs, vec![0xAAu8; 1500]);
}

#[test]
fn one_byte_file_pads_to_512_on_disk_but_extracts_exact() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join("pkg.cfg");
    fs::write(dir.path().join("a.bin"), [0x42u8]).unwrap();
    fs::write(
        &manifest_path,
        "[header]\ntag=np1500\nver=0x1\n\n[pkg]\nidx=1\ninclude=1\nfile=a.bin\nfstype=raw\n",
    )
    .unwrap();

    let image_path = dir.path().join("image.bin");
    let header = build(&manifest_path, &image_path).unwrap();
    assert_eq!(header.slot(1).size, 1);
    assert_eq!(header.slot(1).fstype(), FsType::Raw);

    let on_disk = fs::read(&image_path).unwrap();
    assert_eq!(on_disk.len(), 2048 + 512);

    let out_dir = dir.path().join("extracted");
    extract(
        &image_path,
        &out_dir,
        ExtractOptions {
            extract_payloads: true,
            verbose: false,
        },
    )
    .unwrap();
    let recovered = fs::read(out_dir.join("segment01.bin")).unwrap();
    assert_eq!(recovered, [0x42u8]);
}

#[test]
fn empty_slots_produce_no_pkg_block() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join("pkg.cfg");
    fs::write(dir.path().join("a.bin"), [1u8]).unwrap();
    fs::write(
        &manifest_path,
        "[header]\ntag=np1500\nver=0x1\n\n[pkg]\nidx=5\ninclude=1\nfile=a.bin\n",
    )
    .unwrap();

    let image_path = dir.path().join("image.bin");
    build(&manifest_path, &image_path).unwrap();

    let out_dir = dir.path().join("extracted");
    let manifest_text = extract(&image_path, &out_dir, ExtractOptions::default()).unwrap();

    let pkg_blocks = manifest_text.matches("[pkg]").count();
    assert_eq!(pkg_blocks, 1);
    assert!(manifest_text.contains("idx=5"));
}
