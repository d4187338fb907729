//! Minimal EBML reader used to walk muxer output in tests.

#![allow(dead_code)]

use std::io::{self, Cursor, Read, Seek};

/// An element header and where it sits in the buffer.
#[derive(Clone, Debug)]
pub struct Element {
    pub id: u32,
    pub size: u64,
    /// ID + size field length.
    pub header_size: u64,
    /// Offset of the first id byte.
    pub position: u64,
}

impl Element {
    pub fn data_offset(&self) -> u64 {
        self.position + self.header_size
    }

    pub fn end_offset(&self) -> u64 {
        self.data_offset() + self.size
    }

    pub fn payload<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.data_offset() as usize..self.end_offset() as usize]
    }

    pub fn uint(&self, data: &[u8]) -> u64 {
        self.payload(data)
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
    }

    pub fn float(&self, data: &[u8]) -> f64 {
        let bytes: [u8; 8] = self.payload(data).try_into().expect("8-byte float");
        f64::from_be_bytes(bytes)
    }

    pub fn string(&self, data: &[u8]) -> String {
        String::from_utf8(self.payload(data).to_vec()).expect("utf-8 string")
    }
}

fn read_one_byte<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn vint_width(first: u8) -> io::Result<u32> {
    match first.leading_zeros() {
        n @ 0..=7 => Ok(n + 1),
        _ => Err(io::Error::new(io::ErrorKind::InvalidData, "zero vint lead byte")),
    }
}

/// Read an element id; the marker bit stays part of the id.
pub fn read_vint_id<R: Read>(reader: &mut R) -> io::Result<u32> {
    let first = read_one_byte(reader)?;
    let width = vint_width(first)?;
    let mut id = u32::from(first);
    for _ in 1..width {
        id = (id << 8) | u32::from(read_one_byte(reader)?);
    }
    Ok(id)
}

/// Read a size vint with the marker bit stripped.
pub fn read_vint_size<R: Read>(reader: &mut R) -> io::Result<u64> {
    let first = read_one_byte(reader)?;
    let width = vint_width(first)?;
    let mask = 0xFFu16 >> width;
    let mut value = u64::from(first) & u64::from(mask);
    for _ in 1..width {
        value = (value << 8) | u64::from(read_one_byte(reader)?);
    }
    Ok(value)
}

pub fn read_element<R: Read + Seek>(reader: &mut R) -> io::Result<Element> {
    let position = reader.stream_position()?;
    let id = read_vint_id(reader)?;
    let size = read_vint_size(reader)?;
    let header_size = reader.stream_position()? - position;
    Ok(Element {
        id,
        size,
        header_size,
        position,
    })
}

/// Elements laid back to back in `data[start..end]`.
pub fn elements_in(data: &[u8], start: u64, end: u64) -> Vec<Element> {
    let mut cursor = Cursor::new(data);
    cursor.set_position(start);
    let mut out = Vec::new();
    while cursor.position() < end {
        let el = read_element(&mut cursor).expect("well-formed element");
        cursor.set_position(el.end_offset());
        out.push(el);
    }
    assert_eq!(cursor.position(), end, "children overrun their parent");
    out
}

pub fn top_level(data: &[u8]) -> Vec<Element> {
    elements_in(data, 0, data.len() as u64)
}

pub fn children(data: &[u8], parent: &Element) -> Vec<Element> {
    elements_in(data, parent.data_offset(), parent.end_offset())
}

pub fn find<'a>(elements: &'a [Element], id: u32) -> &'a Element {
    elements
        .iter()
        .find(|e| e.id == id)
        .unwrap_or_else(|| panic!("element {id:#X} not found"))
}

pub fn find_all(elements: &[Element], id: u32) -> Vec<&Element> {
    elements.iter().filter(|e| e.id == id).collect()
}

/// The Segment element and its level-1 children.
pub fn segment(data: &[u8]) -> (Element, Vec<Element>) {
    let top = top_level(data);
    assert_eq!(top.len(), 2, "EBML header + Segment");
    let segment = top[1].clone();
    let body = children(data, &segment);
    (segment, body)
}

/// One decoded SimpleBlock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub track: u8,
    /// Cluster timecode + relative timecode.
    pub timecode: i64,
    pub relative: i16,
    pub flags: u8,
    pub payload: Vec<u8>,
    /// Index of the owning cluster among all clusters.
    pub cluster: usize,
    /// 1-based index within the cluster.
    pub block_number: u64,
}

impl Block {
    pub fn is_key(&self) -> bool {
        self.flags & 0x80 != 0
    }
}

/// Every block in emission order.
pub fn blocks(data: &[u8]) -> Vec<Block> {
    let (_, body) = segment(data);
    let mut out = Vec::new();
    for (cluster_index, cluster) in find_all(&body, 0x1F43B675).into_iter().enumerate() {
        let kids = children(data, cluster);
        let cluster_tc = find(&kids, 0xE7).uint(data) as i64;
        let mut number = 0;
        for el in kids.iter().filter(|e| e.id == 0xA3) {
            let body = el.payload(data);
            number += 1;
            let relative = i16::from_be_bytes([body[1], body[2]]);
            out.push(Block {
                track: body[0] & 0x7F,
                timecode: cluster_tc + i64::from(relative),
                relative,
                flags: body[3],
                payload: body[4..].to_vec(),
                cluster: cluster_index,
                block_number: number,
            });
        }
    }
    out
}

/// One decoded CuePoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cue {
    pub time: u64,
    pub track: u64,
    pub cluster_position: u64,
    pub block_number: u64,
}

pub fn cues(data: &[u8]) -> Vec<Cue> {
    let (_, body) = segment(data);
    let cues = find(&body, 0x1C53BB6B);
    children(data, cues)
        .iter()
        .map(|point| {
            let kids = children(data, point);
            let positions = children(data, find(&kids, 0xB7));
            Cue {
                time: find(&kids, 0xB3).uint(data),
                track: find(&positions, 0xF7).uint(data),
                cluster_position: find(&positions, 0xF1).uint(data),
                block_number: find(&positions, 0x5378).uint(data),
            }
        })
        .collect()
}
