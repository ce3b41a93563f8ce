//! Huffman Coding
//!
//! This module is the codec core.  It derives an optimal prefix-free code
//! from symbol frequencies and packs or unpacks byte streams against that
//! code.  The two entry points are `encode` and `decode`; the intermediate
//! stages (frequency counting, tree construction, code assignment, bit
//! packing) are exposed separately for callers that want them.
//!
//! * Symbols are bytes, codes are `BitVec` values with exact bit lengths
//! * The tree is discarded once the code table has been extracted
//! * Anything that persists `(CodeTable,BitVec)` pairs must keep the exact
//!   bit length of the payload, see the `container` module

use bit_vec::BitVec;
use std::cmp::Ordering;
use std::collections::{BTreeMap,BinaryHeap,HashMap};
use crate::Error;

/// Map from symbol to occurrence count, ordered by symbol value.
/// The ordering matters: leaves are fed to the priority queue in
/// ascending symbol order, which pins down the output codes.
pub type FreqMap = BTreeMap<u8,u64>;

/// Huffman tree node.  A leaf holds exactly one symbol, an internal
/// node holds exactly two subtrees and no symbol.
pub enum Node {
    Leaf { symbol: u8 },
    Internal { left: Box<Node>, right: Box<Node> }
}

/// Priority queue entry.  The weight is the subtree's total frequency.
/// The sequence number is assigned at insertion time and breaks ties
/// between equal weights, so that merge order never depends on the
/// queue's internal layout and equal inputs always yield equal codes.
struct Weighted {
    weight: u64,
    seq: u32,
    node: Node
}

impl PartialEq for Weighted {
    fn eq(&self,other: &Self) -> bool {
        self.weight==other.weight && self.seq==other.seq
    }
}

impl Eq for Weighted {}

impl PartialOrd for Weighted {
    fn partial_cmp(&self,other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Weighted {
    fn cmp(&self,other: &Self) -> Ordering {
        // BinaryHeap pops the maximum, so reverse both keys to pop the
        // lightest node first, oldest first among equals
        other.weight.cmp(&self.weight).then(other.seq.cmp(&self.seq))
    }
}

/// Scan a byte sequence and count occurrences of each symbol.
/// Empty input yields an empty map.
pub fn count_frequencies(data: &[u8]) -> FreqMap {
    let mut freq = FreqMap::new();
    for &symbol in data {
        *freq.entry(symbol).or_insert(0) += 1;
    }
    freq
}

/// Build the Huffman tree for a frequency map.
///
/// One leaf per distinct symbol goes into a min-priority queue keyed on
/// frequency; the two lightest nodes are merged under a new internal node
/// weighing their sum until a single root remains.  Ties are broken by
/// insertion sequence number (see `Weighted`).  A map with one distinct
/// symbol yields a lone leaf with no merges performed.
pub fn build_tree(freq: &FreqMap) -> Result<Node,Error> {
    if freq.is_empty() {
        return Err(Error::InvalidInput);
    }
    let mut seq: u32 = 0;
    let mut heap = BinaryHeap::with_capacity(freq.len());
    for (&symbol,&count) in freq.iter() {
        heap.push(Weighted { weight: count, seq, node: Node::Leaf { symbol } });
        seq += 1;
    }
    while heap.len() > 1 {
        let light = heap.pop().unwrap();
        let heavy = heap.pop().unwrap();
        heap.push(Weighted {
            weight: light.weight + heavy.weight,
            seq,
            node: Node::Internal { left: Box::new(light.node), right: Box::new(heavy.node) }
        });
        seq += 1;
    }
    Ok(heap.pop().unwrap().node)
}

/// Map from symbol to prefix-free bit code
#[derive(Clone,Debug,PartialEq,Eq,Default)]
pub struct CodeTable {
    codes: BTreeMap<u8,BitVec>
}

/// Inverse of a `CodeTable`, maps exact bit codes back to symbols
pub struct DecodingTable {
    map: HashMap<BitVec,u8>
}

impl CodeTable {
    pub fn new() -> Self {
        Self { codes: BTreeMap::new() }
    }
    /// Extract the code table from a tree by depth-first traversal.
    /// A left edge appends 0, a right edge appends 1.  A root that is
    /// itself a leaf gets the one-bit code 0, since an empty code could
    /// not be packed or unpacked unambiguously.
    pub fn from_tree(root: &Node) -> Self {
        let mut table = Self::new();
        let mut prefix = BitVec::new();
        table.walk(root,&mut prefix);
        table
    }
    fn walk(&mut self,node: &Node,prefix: &mut BitVec) {
        match node {
            Node::Leaf { symbol } => {
                let code = match prefix.is_empty() {
                    true => BitVec::from_elem(1,false),
                    false => prefix.clone()
                };
                self.codes.insert(*symbol,code);
            },
            Node::Internal { left, right } => {
                prefix.push(false);
                self.walk(left,prefix);
                prefix.pop();
                prefix.push(true);
                self.walk(right,prefix);
                prefix.pop();
            }
        }
    }
    pub fn insert(&mut self,symbol: u8,code: BitVec) {
        self.codes.insert(symbol,code);
    }
    pub fn get(&self,symbol: u8) -> Option<&BitVec> {
        self.codes.get(&symbol)
    }
    pub fn iter(&self) -> std::collections::btree_map::Iter<u8,BitVec> {
        self.codes.iter()
    }
    pub fn len(&self) -> usize {
        self.codes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
    /// Invert the table for decoding.  Codes are unique per symbol, so
    /// the inversion never collides.
    pub fn invert(&self) -> DecodingTable {
        let mut map = HashMap::with_capacity(self.codes.len());
        for (&symbol,code) in self.codes.iter() {
            map.insert(code.clone(),symbol);
        }
        DecodingTable { map }
    }
}

impl DecodingTable {
    pub fn get(&self,code: &BitVec) -> Option<u8> {
        self.map.get(code).copied()
    }
}

/// Concatenate the code for each input symbol, in input order, into one
/// bit vector.  Fails if a symbol is missing from the table, which can
/// only happen when the table was derived from different data.
pub fn pack(data: &[u8],table: &CodeTable) -> Result<BitVec,Error> {
    let mut bits = BitVec::new();
    for &symbol in data {
        let code = table.get(symbol).ok_or(Error::Encoding)?;
        bits.extend(code.iter());
    }
    Ok(bits)
}

/// Scan the payload left to right, accumulating bits into a candidate
/// code and emitting a symbol whenever the candidate matches a table
/// entry.  The first match is always final because the code is
/// prefix-free.  Bits left over after the last match mean the payload
/// was truncated or does not belong to this table.
pub fn unpack(bits: &BitVec,table: &DecodingTable) -> Result<Vec<u8>,Error> {
    let mut data = Vec::new();
    let mut candidate = BitVec::new();
    for bit in bits.iter() {
        candidate.push(bit);
        if let Some(symbol) = table.get(&candidate) {
            data.push(symbol);
            candidate = BitVec::new();
        }
    }
    if !candidate.is_empty() {
        return Err(Error::Decoding);
    }
    Ok(data)
}

/// Compress a byte sequence, returning the code table and the packed
/// payload.  Empty input yields an empty table and an empty payload.
pub fn encode(data: &[u8]) -> Result<(CodeTable,BitVec),Error> {
    if data.is_empty() {
        return Ok((CodeTable::new(),BitVec::new()));
    }
    let freq = count_frequencies(data);
    let tree = build_tree(&freq)?;
    let table = CodeTable::from_tree(&tree);
    let bits = pack(data,&table)?;
    Ok((table,bits))
}

/// Reconstruct the original byte sequence from a code table and a packed
/// payload.  An empty payload yields an empty sequence.
pub fn decode(table: &CodeTable,payload: &BitVec) -> Result<Vec<u8>,Error> {
    if payload.is_empty() {
        return Ok(Vec::new());
    }
    unpack(payload,&table.invert())
}

#[test]
fn frequencies_sum_to_length() {
    let data = "abracadabra".as_bytes();
    let freq = count_frequencies(data);
    assert_eq!(freq.len(),5);
    assert_eq!(freq[&b'a'],5);
    assert_eq!(freq[&b'b'],2);
    assert_eq!(freq[&b'r'],2);
    assert_eq!(freq[&b'c'],1);
    assert_eq!(freq[&b'd'],1);
    assert_eq!(freq.values().sum::<u64>(),data.len() as u64);
    assert!(count_frequencies(&[]).is_empty());
}

#[test]
fn tree_shape() {
    fn count(node: &Node) -> (usize,usize) {
        match node {
            Node::Leaf {..} => (1,0),
            Node::Internal { left, right } => {
                let (l1,i1) = count(left);
                let (l2,i2) = count(right);
                (l1+l2,i1+i2+1)
            }
        }
    }
    let freq = count_frequencies("abracadabra".as_bytes());
    let tree = build_tree(&freq).expect("tree failed");
    assert_eq!(count(&tree),(5,4));
}

#[test]
fn worked_example() {
    let data = "abracadabra".as_bytes();
    let (table,payload) = encode(data).expect("encoding failed");
    assert_eq!(table.len(),5);
    let a = table.get(b'a').unwrap().len();
    assert!(a < table.get(b'c').unwrap().len());
    assert!(a < table.get(b'd').unwrap().len());
    assert_eq!(decode(&table,&payload).expect("decoding failed"),data.to_vec());
}

#[test]
fn prefix_free() {
    let data = "this is an example of a huffman tree".as_bytes();
    let (table,_) = encode(data).expect("encoding failed");
    let codes: Vec<&BitVec> = table.iter().map(|(_,c)| c).collect();
    for (i,a) in codes.iter().enumerate() {
        for (j,b) in codes.iter().enumerate() {
            if i!=j && a.len() <= b.len() {
                assert!(!a.iter().zip(b.iter()).all(|(x,y)| x==y));
            }
        }
    }
}

#[test]
fn deterministic_output() {
    let data = "mississippi riverbed".as_bytes();
    let (table1,payload1) = encode(data).expect("encoding failed");
    let (table2,payload2) = encode(data).expect("encoding failed");
    assert_eq!(table1,table2);
    assert_eq!(payload1,payload2);
}

#[test]
fn single_symbol() {
    let (table,payload) = encode(b"aaaa").expect("encoding failed");
    assert_eq!(table.len(),1);
    assert_eq!(table.get(b'a').unwrap().len(),1);
    assert_eq!(payload.len(),4);
    assert_eq!(decode(&table,&payload).expect("decoding failed"),b"aaaa".to_vec());
}

#[test]
fn empty_input() {
    let (table,payload) = encode(&[]).expect("encoding failed");
    assert!(table.is_empty());
    assert!(payload.is_empty());
    assert_eq!(decode(&table,&payload).expect("decoding failed"),Vec::<u8>::new());
}

#[test]
fn beats_fixed_width() {
    // 4 distinct symbols with skewed counts, fixed width would be 2 bits each
    let data = "aaaaaaaaaaaaaaaaaaaabbbbbcccd".as_bytes();
    let (_,payload) = encode(data).expect("encoding failed");
    assert!(payload.len() < data.len()*2);
}

#[test]
fn rejects_empty_frequency_map() {
    assert!(matches!(build_tree(&FreqMap::new()),Err(Error::InvalidInput)));
}

#[test]
fn rejects_unknown_symbol() {
    let (table,_) = encode(b"aab").expect("encoding failed");
    assert!(matches!(pack(b"abc",&table),Err(Error::Encoding)));
}

#[test]
fn rejects_truncated_payload() {
    let (table,payload) = encode("abracadabra".as_bytes()).expect("encoding failed");
    let mut clipped = payload.clone();
    clipped.truncate(payload.len()-2);
    assert!(matches!(decode(&table,&clipped),Err(Error::Decoding)));
}
