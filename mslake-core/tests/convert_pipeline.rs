//! End-to-end conversion over a synthetic legacy tree.
//!
//! Builds a MASTER index plus an F1.dat price file byte-by-byte, runs
//! the full driver, and checks the archive and map-file output.

use chrono::NaiveDate;
use mslake_core::mbf::ieee_to_msbin;
use mslake_core::walker::MASTER_FILE;
use mslake_core::{run, ConvertConfig, ConvertError};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use zip::ZipArchive;

fn msfloat(v: f32) -> [u8; 4] {
    ieee_to_msbin(v).to_le_bytes()
}

/// One 53-byte MASTER entry for a 6-field security in file F1.
fn master_bytes(name: &str, symbol: &str) -> Vec<u8> {
    let mut buf = vec![0u8; 53]; // header: counters zeroed, reserved zeroed
    buf[0] = 1; // num_files

    let mut rec = Vec::with_capacity(53);
    rec.push(1); // file_num
    rec.extend_from_slice(&[0xe0, 0x00]); // type
    rec.push(24); // record length
    rec.push(6); // fields
    rec.extend_from_slice(&[0, 0]); // reserved
    let mut name_buf = [b' '; 16];
    name_buf[..name.len()].copy_from_slice(name.as_bytes());
    rec.extend_from_slice(&name_buf);
    rec.extend_from_slice(&[0, 0]); // reserved + vflag
    rec.extend_from_slice(&msfloat(1_010_101.0)); // first date
    rec.extend_from_slice(&msfloat(1_010_212.0)); // last date
    rec.push(b'D'); // period
    rec.extend_from_slice(&[0, 0]); // time
    let mut sym_buf = [0u8; 14];
    sym_buf[..symbol.len()].copy_from_slice(symbol.as_bytes());
    rec.extend_from_slice(&sym_buf);
    rec.extend_from_slice(&[0, 0, 0]); // reserved + autorun + reserved
    assert_eq!(rec.len(), 53);

    buf.extend_from_slice(&rec);
    buf
}

/// 6-field F-file: one header slot, then one record per packed date.
fn price_file_bytes(dates: &[f32]) -> Vec<u8> {
    let mut buf = vec![0u8; 24];
    for date in dates {
        buf.extend_from_slice(&msfloat(*date));
        buf.extend_from_slice(&msfloat(10.25)); // open
        buf.extend_from_slice(&msfloat(11.0)); // high
        buf.extend_from_slice(&msfloat(10.0)); // low
        buf.extend_from_slice(&msfloat(10.5)); // close
        buf.extend_from_slice(&msfloat(5000.0)); // volume
    }
    buf
}

fn write_file(path: &Path, bytes: &[u8]) {
    let mut file = File::create(path).unwrap();
    file.write_all(bytes).unwrap();
}

fn read_zip_lines(path: &Path, entry_name: &str) -> Vec<String> {
    let file = File::open(path).unwrap();
    let mut archive = ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(entry_name).unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content.lines().map(String::from).collect()
}

#[test]
fn converts_gapped_history_into_post_gap_archive_and_registry() {
    let source = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();

    let market = source.path().join("stockholm");
    fs::create_dir_all(&market).unwrap();
    write_file(&market.join(MASTER_FILE), &master_bytes("VOLVO B", "VOLVY"));
    // Five contiguous days, a 36-day jump, then two contiguous days.
    write_file(
        &market.join("F1.dat"),
        &price_file_bytes(&[
            1_010_101.0,
            1_010_102.0,
            1_010_103.0,
            1_010_104.0,
            1_010_105.0,
            1_010_210.0,
            1_010_211.0,
            1_010_212.0,
        ]),
    );

    let config = ConvertConfig::new(source.path(), dest.path());
    let summary = run(&config).unwrap();
    assert_eq!(summary.securities_seen, 1);
    assert_eq!(summary.securities_written, 1);
    assert_eq!(summary.securities_empty, 0);

    // Archive holds only the contiguous post-gap run.
    let zip_path = dest
        .path()
        .join("equity/metastock/daily/volvy.zip");
    assert!(zip_path.exists());
    let lines = read_zip_lines(&zip_path, "volvy.csv");
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("20010210 00:00,"));
    assert!(lines[2].starts_with("20010212 00:00,"));

    // Registry: one 2-row entry whose first date is the post-gap start.
    let map_path = dest
        .path()
        .join("equity/metastock/map_files/volvy.csv");
    let map = fs::read_to_string(&map_path).unwrap();
    let rows: Vec<&str> = map.lines().collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], "20010210,volvy");
    assert_eq!(rows[1], "20501231,volvy");
}

#[test]
fn rerun_replaces_output_and_stays_idempotent() {
    let source = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();

    write_file(&source.path().join(MASTER_FILE), &master_bytes("VOLVO B", "VOLVY"));
    write_file(
        &source.path().join("F1.dat"),
        &price_file_bytes(&[1_010_101.0, 1_010_102.0]),
    );

    let config = ConvertConfig::new(source.path(), dest.path());
    run(&config).unwrap();
    let summary = run(&config).unwrap();
    assert_eq!(summary.securities_written, 1);

    let map_path = dest.path().join("equity/metastock/map_files/volvy.csv");
    let map = fs::read_to_string(&map_path).unwrap();
    assert_eq!(map.lines().count(), 2);
    assert_eq!(
        map.lines().next().unwrap(),
        format!(
            "{},volvy",
            NaiveDate::from_ymd_opt(2001, 1, 1).unwrap().format("%Y%m%d")
        )
    );
}

#[test]
fn empty_security_produces_no_output_files() {
    let source = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();

    // MASTER entry without a data file: zero bars, nothing written.
    write_file(&source.path().join(MASTER_FILE), &master_bytes("GHOST", "GH"));

    let summary = run(&ConvertConfig::new(source.path(), dest.path())).unwrap();
    assert_eq!(summary.securities_seen, 1);
    assert_eq!(summary.securities_empty, 1);
    assert!(!dest.path().join("equity/metastock/daily/gh.zip").exists());
    assert!(!dest
        .path()
        .join("equity/metastock/map_files/gh.csv")
        .exists());
}

#[test]
fn missing_source_aborts_the_run() {
    let dest = tempfile::tempdir().unwrap();
    let err = run(&ConvertConfig::new("/definitely/not/here", dest.path())).unwrap_err();
    assert!(matches!(err, ConvertError::MissingSource(_)));
}
