use std::error::Error;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::ArgAction::SetTrue;
use clap::{ArgGroup, Parser};

use huffman_text::{decode, encode, BitFormat, CodeTable, HuffmanError, Summary};

/// Extension given to encoded files
const ENCODED_EXTENSION: &str = "huf";
/// Appended to the file stem of decoded files
const DECODED_SUFFIX: &str = "_decoded";

/// Encode a text file with a prefix code built from its own character counts,
/// or decode a file produced that way
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(group(ArgGroup::new("mode").required(true).args(["encode", "decode"])))]
struct Args {
    /// Text file to encode
    #[clap(short, long, value_name = "FILE")]
    encode: Option<PathBuf>,

    /// Encoded file to decode
    #[clap(short, long, value_name = "FILE")]
    decode: Option<PathBuf>,

    /// How encoded bits are stored
    #[clap(short, long, value_enum, default_value_t = BitFormat::Packed)]
    format: BitFormat,

    /// Write here instead of next to the source file
    #[clap(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the code tree
    #[clap(long, default_value_t = false, action(SetTrue))]
    print_tree: bool,

    /// Print the code of every character
    #[clap(long, default_value_t = false, action(SetTrue))]
    print_codes: bool,
}

/// `notes.txt` becomes `notes.huf`
fn encoded_path(source: &Path) -> PathBuf {
    source.with_extension(ENCODED_EXTENSION)
}

/// `notes.huf` becomes `notes_decoded.huf`
fn decoded_path(source: &Path) -> PathBuf {
    let mut name: OsString = source.file_stem().unwrap_or_default().to_owned();
    name.push(DECODED_SUFFIX);
    if let Some(extension) = source.extension() {
        name.push(".");
        name.push(extension);
    }
    source.with_file_name(name)
}

/// Refuses to write over the file being read
fn check_distinct(source: &Path, output: &Path) -> io::Result<()> {
    if output.exists() && fs::canonicalize(source)? == fs::canonicalize(output)? {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("output {} is the source file", output.display()),
        ));
    }
    Ok(())
}

/// Runs `op` against a fresh output file, removing the file again if `op`
/// fails so no half-written result is left behind
fn with_output<F>(path: &Path, op: F) -> Result<Summary, Box<dyn Error>>
where
    F: FnOnce(BufWriter<File>) -> Result<Summary, HuffmanError>,
{
    let out = BufWriter::new(File::create(path)?);
    op(out).map_err(|e| {
        if let Err(cleanup) = fs::remove_file(path) {
            eprintln!("could not remove {}: {}", path.display(), cleanup);
        }
        e.into()
    })
}

fn encode_file(
    source: &Path,
    output: &Path,
    format: BitFormat,
) -> Result<Summary, Box<dyn Error>> {
    check_distinct(source, output)?;
    let input = BufReader::new(File::open(source)?);
    with_output(output, |out| encode(input, out, format))
}

fn decode_file(source: &Path, output: &Path) -> Result<Summary, Box<dyn Error>> {
    check_distinct(source, output)?;
    let input = BufReader::new(File::open(source)?);
    with_output(output, |out| decode(input, out))
}

fn report(args: &Args, action: &str, output: &Path, summary: &Summary) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = io::BufWriter::new(stdout.lock());

    writeln!(handle, "{} {}", action, output.display())?;
    writeln!(handle, "\tCharacters: {}", summary.symbols)?;
    writeln!(handle, "\tDistinct characters: {}", summary.tree.leaf_count())?;
    writeln!(handle, "\tEncoded bits: {}", summary.bits)?;
    writeln!(handle, "\tBit format: {:?}", summary.format)?;

    if args.print_tree {
        write!(handle, "{}", summary.tree)?;
    }
    if args.print_codes {
        let table = CodeTable::from(&summary.tree);
        let mut codes: Vec<_> = table.iter().collect();
        codes.sort_by_key(|(ch, _)| **ch);
        for (ch, code) in codes {
            writeln!(handle, "{:?}\t{}", ch, code)?;
        }
    }
    handle.flush()
}

fn main() -> Result<(), Box<dyn Error>> {
    let args: Args = Args::parse();

    if let Some(source) = &args.encode {
        let output = args.output.clone().unwrap_or_else(|| encoded_path(source));
        let summary = encode_file(source, &output, args.format)?;
        report(&args, "Encoded to", &output, &summary)?;
    } else if let Some(source) = &args.decode {
        let output = args.output.clone().unwrap_or_else(|| decoded_path(source));
        let summary = decode_file(source, &output)?;
        report(&args, "Decoded to", &output, &summary)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A fresh, empty directory under the system temp dir
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("huffman-text-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn entries(dir: &Path) -> Vec<PathBuf> {
        let mut names: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn file_round_trip() {
        let dir = scratch_dir("round-trip");
        let source = dir.join("notes.txt");
        fs::write(&source, "hello world\n").unwrap();

        let encoded = encoded_path(&source);
        encode_file(&source, &encoded, BitFormat::Packed).unwrap();
        let decoded = decoded_path(&encoded);
        decode_file(&encoded, &decoded).unwrap();
        assert_eq!(fs::read_to_string(&decoded).unwrap(), "hello world\n");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn encoding_onto_the_default_name_keeps_the_source() {
        let dir = scratch_dir("default-name");
        let source = dir.join("notes.huf");
        fs::write(&source, "hello world\n").unwrap();

        let output = encoded_path(&source);
        assert_eq!(output, source);
        assert!(encode_file(&source, &output, BitFormat::Packed).is_err());
        assert_eq!(fs::read_to_string(&source).unwrap(), "hello world\n");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn output_flag_onto_the_source_keeps_the_source() {
        let dir = scratch_dir("output-flag");
        let text = dir.join("a.txt");
        fs::write(&text, "hello world\n").unwrap();
        assert!(encode_file(&text, &text, BitFormat::Text).is_err());
        assert_eq!(fs::read_to_string(&text).unwrap(), "hello world\n");

        let encoded = dir.join("x.huf");
        encode_file(&text, &encoded, BitFormat::Text).unwrap();
        let before = fs::read(&encoded).unwrap();
        // same file through a different spelling of the path
        let aliased = dir.join(".").join("x.huf");
        assert!(decode_file(&encoded, &aliased).is_err());
        assert_eq!(fs::read(&encoded).unwrap(), before);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn failed_decode_leaves_no_output() {
        let dir = scratch_dir("bad-decode");
        let source = dir.join("broken.huf");
        fs::write(&source, b"HUFT?garbage").unwrap();
        let output = decoded_path(&source);

        assert!(decode_file(&source, &output).is_err());
        assert!(!output.exists());
        assert_eq!(entries(&dir), vec![source]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn failed_encode_leaves_no_output() {
        let dir = scratch_dir("empty-encode");
        let source = dir.join("empty.txt");
        fs::write(&source, "").unwrap();
        let output = encoded_path(&source);

        let err = encode_file(&source, &output, BitFormat::Packed).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HuffmanError>(),
            Some(HuffmanError::EmptyAlphabet)
        ));
        assert!(!output.exists());
        assert_eq!(entries(&dir), vec![source]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn encoded_name_replaces_extension() {
        assert_eq!(
            encoded_path(Path::new("books/Grimms.txt")),
            PathBuf::from("books/Grimms.huf")
        );
        assert_eq!(encoded_path(Path::new("Grimms")), PathBuf::from("Grimms.huf"));
    }

    #[test]
    fn decoded_name_appends_suffix_before_extension() {
        assert_eq!(
            decoded_path(Path::new("books/Grimms.huf")),
            PathBuf::from("books/Grimms_decoded.huf")
        );
        assert_eq!(decoded_path(Path::new("Grimms")), PathBuf::from("Grimms_decoded"));
    }

    #[test]
    fn modes_are_exclusive() {
        assert!(Args::try_parse_from(["huffman-text", "-e", "a.txt", "-d", "a.huf"]).is_err());
        assert!(Args::try_parse_from(["huffman-text"]).is_err());
        let args = Args::try_parse_from(["huffman-text", "-e", "a.txt", "-f", "text"]).unwrap();
        assert_eq!(args.format, BitFormat::Text);
        assert_eq!(args.encode, Some(PathBuf::from("a.txt")));
    }
}
