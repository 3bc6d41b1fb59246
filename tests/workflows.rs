//! End to end runs of each operation over the files in `.test/`.

use circkit::boundary::{clean_boundaries, clean_boundaries_in_place};
use circkit::error::CircError;
use circkit::genome::ChromSizes;
use circkit::gtf::rebuild_gtf;
use circkit::junction::{filter_junctions, JunctionRecord, JunctionThresholds};
use circkit::myio;
use circkit::strand::{output_names, split_sam, StrandRouting};
use circkit::tabular::OnInvalid;
use std::fs;
use std::io::{BufRead, Write};
use tempfile::tempdir;

fn read_lines(path: &str) -> Vec<String> {
    myio::reader(path)
        .unwrap()
        .lines()
        .map(|l| l.unwrap())
        .collect()
}

#[test]
fn test_junction_filter_from_file_to_gz() {
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("filtered.bed.gz");
    let out_path = out_path.to_str().unwrap();
    {
        let mut out = myio::writer(out_path).unwrap();
        let summary = filter_junctions(
            myio::reader(".test/circ_junctions.bed").unwrap(),
            &mut out,
            &JunctionThresholds::default(),
            OnInvalid::Fail,
            ".test/circ_junctions.bed",
        )
        .unwrap();
        assert_eq!(summary.read, 10);
        assert_eq!(summary.kept, 5);
    }
    let counts: Vec<u64> = read_lines(out_path)
        .iter()
        .map(|l| JunctionRecord::parse(l, 0).unwrap().n_uniq)
        .collect();
    assert_eq!(counts, vec![60, 50, 12, 3, 2]);
    // kept lines keep every trailing column
    assert!(read_lines(out_path)[0].ends_with("\ttissue\t60\tN\tOK"));
}

#[test]
fn test_rebuild_gtf_file() {
    let mut out = Vec::new();
    let rebuilder = rebuild_gtf(
        myio::reader(".test/circ.pre.gtf").unwrap(),
        &mut out,
        OnInvalid::Fail,
    )
    .unwrap();
    assert_eq!(rebuilder.transcripts, 2);
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 8);
    assert_eq!(lines[0], "#!circRNA pre-gtf");
    assert!(lines[1].starts_with("chr1\tcirc\ttranscript\t10000\t11200\t"));
    assert!(lines[2].contains("exon_number \"1\"; gene_name \"G1\";"));
    assert!(lines[4].contains("exon_number \"3\";"));
    assert!(lines[5].starts_with("chr2\tcirc\ttranscript\t20000\t21300\t"));
    assert!(lines[7].contains("exon_number \"2\";"));
}

#[test]
fn test_split_strand_files() {
    let dir = tempdir().unwrap();
    let prefix = dir.path().join("sample");
    let (f_name, r_name) = output_names(prefix.to_str().unwrap());
    {
        let mut forward = myio::writer(&f_name).unwrap();
        let mut reverse = myio::writer(&r_name).unwrap();
        let counts = split_sam(
            myio::reader(".test/sample.sam").unwrap(),
            &mut forward,
            &mut reverse,
            StrandRouting::default(),
            OnInvalid::Fail,
        )
        .unwrap();
        assert_eq!((counts.forward, counts.reverse, counts.header), (3, 3, 2));
        forward.flush().unwrap();
        reverse.flush().unwrap();
    }
    let forward = read_lines(&f_name);
    let flags: Vec<&str> = forward
        .iter()
        .filter(|l| !l.starts_with('@'))
        .map(|l| l.split('\t').nth(1).unwrap())
        .collect();
    assert_eq!(flags, vec!["99", "147", "0"]);
    assert_eq!(read_lines(&r_name).len(), 5);
}

#[test]
fn test_clean_boundary_with_custom_table_and_in_place() {
    let dir = tempdir().unwrap();
    let sizes_path = dir.path().join("hg19.sizes");
    let mut sizes_out = fs::File::create(&sizes_path).unwrap();
    ChromSizes::load("hg19").unwrap().write(&mut sizes_out).unwrap();
    drop(sizes_out);
    let genome = ChromSizes::load(sizes_path.to_str().unwrap()).unwrap();
    assert_eq!(genome.sorted(), ChromSizes::load("hg19").unwrap().sorted());

    let mut out = Vec::new();
    let summary = clean_boundaries(
        myio::reader(".test/boundary.bg").unwrap(),
        &mut out,
        &genome,
        OnInvalid::Fail,
    )
    .unwrap();
    assert_eq!(summary.kept, 2);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "chr1\t100\t249250620\t3\nchr22\t500\t600\t7\textra\n"
    );

    let copy = dir.path().join("boundary.bg");
    fs::copy(".test/boundary.bg", &copy).unwrap();
    let copy = copy.to_str().unwrap();
    clean_boundaries_in_place(copy, &genome, OnInvalid::Fail).unwrap();
    let second = clean_boundaries_in_place(copy, &genome, OnInvalid::Fail).unwrap();
    assert_eq!(second.dropped(), 0);
    assert_eq!(read_lines(copy).len(), 2);
}

#[test]
fn test_empty_junction_file_is_no_data() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.bed");
    fs::write(&path, "").unwrap();
    let path = path.to_str().unwrap();
    let mut out = Vec::new();
    let err = filter_junctions(
        myio::reader(path).unwrap(),
        &mut out,
        &JunctionThresholds::default(),
        OnInvalid::Fail,
        path,
    )
    .unwrap_err();
    assert!(matches!(err, CircError::NoData(_)));
    assert!(out.is_empty());
}

#[test]
fn test_rebuild_comment_only_gtf() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("short.gtf");
    fs::write(&path, "#x\n").unwrap();
    let mut out = Vec::new();
    let rebuilder = rebuild_gtf(
        myio::reader(path.to_str().unwrap()).unwrap(),
        &mut out,
        OnInvalid::Fail,
    )
    .unwrap();
    assert_eq!(rebuilder.transcripts, 0);
    assert_eq!(String::from_utf8(out).unwrap(), "#x\n");
}
