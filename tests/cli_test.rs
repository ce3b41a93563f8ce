use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*; // Assertions on command output
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const TEXT: &str =
"Now is the winter of our discontent
Made glorious summer by this sun of York;
And all the clouds that lour'd upon our house
In the deep bosom of the ocean buried.
";

#[test]
fn cli_round_trip() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("original.txt");
    let packed_path = temp_dir.path().join("packed.huf");
    let restored_path = temp_dir.path().join("restored.txt");
    std::fs::write(&in_path,TEXT)?;

    let mut cmd = Command::cargo_bin("huffpack")?;
    cmd.arg("compress")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&packed_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("compressed"));

    let mut cmd = Command::cargo_bin("huffpack")?;
    cmd.arg("expand")
        .arg("-i").arg(&packed_path)
        .arg("-o").arg(&restored_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("expanded"));

    match (std::fs::read(in_path),std::fs::read(restored_path)) {
        (Ok(v1),Ok(v2)) => {
            assert_eq!(v1,v2);
        },
        _ => panic!("unable to compare output with original")
    }
    Ok(())
}

#[test]
fn cli_compression_shrinks_text() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("original.txt");
    let packed_path = temp_dir.path().join("packed.huf");
    std::fs::write(&in_path,TEXT.repeat(8))?;

    let mut cmd = Command::cargo_bin("huffpack")?;
    cmd.arg("compress")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&packed_path)
        .assert()
        .success();

    let original = std::fs::metadata(temp_dir.path().join("original.txt"))?.len();
    let packed = std::fs::metadata(&packed_path)?.len();
    assert!(packed < original);
    Ok(())
}

#[test]
fn cli_rejects_foreign_file() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("not_a_container.txt");
    let out_path = temp_dir.path().join("restored.txt");
    std::fs::write(&in_path,"this was never compressed")?;

    let mut cmd = Command::cargo_bin("huffpack")?;
    cmd.arg("expand")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&out_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("FileFormatMismatch"));
    Ok(())
}
