//! Container format for compressed files
//!
//! This binds the code table to the packed payload in one versioned
//! stream, so a file can be expanded with no outside knowledge.  Every
//! symbol-to-code mapping is stored along with the exact bit length of
//! the payload; byte padding is therefore never ambiguous and a payload
//! whose leading bits are zero survives the round trip.
//!
//! Layout, integers little endian:
//!
//! * magic `HF` and a version byte (omitted when `Options::header` is false)
//! * u16 count of code table entries
//! * per entry: symbol, code bit length, code bits packed MSB first
//! * u64 payload bit length
//! * payload bits packed MSB first

use bit_vec::BitVec;
use std::io::{Cursor,Read,Write,Seek,SeekFrom};
use crate::huffman;
use crate::huffman::CodeTable;
use crate::{Error,Options,DYNERR};

const MAGIC: [u8;2] = [b'H',b'F'];
const VERSION: u8 = 1;

/// Render a code table and packed payload into container bytes
pub fn serialize(table: &CodeTable,payload: &BitVec,with_header: bool) -> Vec<u8> {
    let mut buf = Vec::new();
    if with_header {
        buf.extend_from_slice(&MAGIC);
        buf.push(VERSION);
    }
    buf.extend_from_slice(&(table.len() as u16).to_le_bytes());
    for (&symbol,code) in table.iter() {
        buf.push(symbol);
        buf.push(code.len() as u8);
        buf.extend_from_slice(&code.to_bytes());
    }
    buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    buf.extend_from_slice(&payload.to_bytes());
    buf
}

/// advance `ptr` past the next `n` bytes and return them
fn take<'a>(buf: &'a [u8],ptr: &mut usize,n: usize) -> Result<&'a [u8],Error> {
    if *ptr + n > buf.len() {
        return Err(Error::Decoding);
    }
    let slice = &buf[*ptr..*ptr+n];
    *ptr += n;
    Ok(slice)
}

/// Recover a code table and packed payload from container bytes.
/// The buffer must contain the container and nothing else.
pub fn deserialize(buf: &[u8],with_header: bool) -> Result<(CodeTable,BitVec),Error> {
    let mut ptr: usize = 0;
    if with_header {
        let header = take(buf,&mut ptr,3)?;
        if header[0..2]!=MAGIC || header[2]!=VERSION {
            return Err(Error::FileFormatMismatch);
        }
    }
    let count = u16::from_le_bytes(take(buf,&mut ptr,2)?.try_into().unwrap()) as usize;
    let mut table = CodeTable::new();
    for _i in 0..count {
        let symbol = take(buf,&mut ptr,1)?[0];
        let nbits = take(buf,&mut ptr,1)?[0] as usize;
        if nbits==0 {
            return Err(Error::FileFormatMismatch);
        }
        let mut code = BitVec::from_bytes(take(buf,&mut ptr,(nbits+7)/8)?);
        code.truncate(nbits);
        table.insert(symbol,code);
    }
    let bit_len = u64::from_le_bytes(take(buf,&mut ptr,8)?.try_into().unwrap());
    if bit_len > (buf.len() - ptr) as u64 * 8 {
        return Err(Error::Decoding);
    }
    let bit_len = bit_len as usize;
    let mut payload = BitVec::from_bytes(take(buf,&mut ptr,(bit_len+7)/8)?);
    payload.truncate(bit_len);
    if ptr!=buf.len() {
        return Err(Error::Decoding);
    }
    Ok((table,payload))
}

/// Compress everything from the input offset onward, writing the
/// container at the output offset.  Returns (input size, absolute end
/// of output) so the caller can truncate the output file.
pub fn compress<R,W>(expanded_in: &mut R,compressed_out: &mut W,opt: &Options) -> Result<(u64,u64),DYNERR>
where R: Read + Seek, W: Write + Seek {
    expanded_in.seek(SeekFrom::Start(opt.in_offset))?;
    let mut data = Vec::new();
    expanded_in.read_to_end(&mut data)?;
    let (table,payload) = huffman::encode(&data)?;
    log::debug!("alphabet of {} symbols, longest code {} bits",
        table.len(),
        table.iter().map(|(_,c)| c.len()).max().unwrap_or(0));
    let container = serialize(&table,&payload,opt.header);
    compressed_out.seek(SeekFrom::Start(opt.out_offset))?;
    compressed_out.write_all(&container)?;
    Ok((data.len() as u64,opt.out_offset + container.len() as u64))
}

/// Expand a container found at the input offset, writing the original
/// bytes at the output offset.  Returns (input size, absolute end of
/// output) so the caller can truncate the output file.
pub fn expand<R,W>(compressed_in: &mut R,expanded_out: &mut W,opt: &Options) -> Result<(u64,u64),DYNERR>
where R: Read + Seek, W: Write + Seek {
    compressed_in.seek(SeekFrom::Start(opt.in_offset))?;
    let mut buf = Vec::new();
    compressed_in.read_to_end(&mut buf)?;
    let (table,payload) = deserialize(&buf,opt.header)?;
    let data = huffman::decode(&table,&payload)?;
    expanded_out.seek(SeekFrom::Start(opt.out_offset))?;
    expanded_out.write_all(&data)?;
    Ok((buf.len() as u64,opt.out_offset + data.len() as u64))
}

/// Convenience function, calls `compress` with a slice returning a Vec
pub fn compress_slice(slice: &[u8]) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    compress(&mut src,&mut ans,&crate::STD_OPTIONS)?;
    Ok(ans.into_inner())
}

/// Convenience function, calls `expand` with a slice returning a Vec
pub fn expand_slice(slice: &[u8]) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    expand(&mut src,&mut ans,&crate::STD_OPTIONS)?;
    Ok(ans.into_inner())
}

#[test]
fn container_layout() {
    // freq {a:2,b:1} gives b the code 0 and a the code 1, payload packs
    // "aab" into the bits 110
    let compressed = compress_slice(b"aab").expect("compression failed");
    let expected = "48 46 01 02 00 61 01 80 62 01 00 03 00 00 00 00 00 00 00 C0";
    assert_eq!(compressed,hex::decode(expected.replace(" ","")).unwrap());
}

#[test]
fn invertibility() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = compress_slice(test_data).expect("compression failed");
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn empty_file_round_trip() {
    let compressed = compress_slice(&[]).expect("compression failed");
    assert_eq!(compressed.len(),13);
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(expanded,Vec::<u8>::new());
}

#[test]
fn headerless_round_trip() {
    let test_data = "for the rain it raineth every day".as_bytes();
    let (table,payload) = huffman::encode(test_data).expect("encoding failed");
    let buf = serialize(&table,&payload,false);
    let (table2,payload2) = deserialize(&buf,false).expect("deserialization failed");
    assert_eq!(table,table2);
    assert_eq!(payload,payload2);
    assert_eq!(huffman::decode(&table2,&payload2).expect("decoding failed"),test_data.to_vec());
}

#[test]
fn rejects_bad_magic() {
    let mut compressed = compress_slice(b"some data").expect("compression failed");
    compressed[0] = b'X';
    assert!(matches!(expand_slice(&compressed).unwrap_err().downcast_ref::<Error>(),
        Some(Error::FileFormatMismatch)));
}

#[test]
fn rejects_truncated_container() {
    let compressed = compress_slice(b"some data").expect("compression failed");
    assert!(expand_slice(&compressed[0..compressed.len()-1]).is_err());
}
