//! The partition: pack, primer, header metadata, index segments, and
//! sequential essence iteration (spec §3/§4.7).
//!
//! `ReadMetadata`/`SeekEssence`/`NextElement` are grounded on the
//! "read one record, report where the next one starts" shape of
//! `exiftool-core/src/ifd.rs`'s IFD walk, generalised from a fixed-size
//! tag/value loop to KLV items whose sizes vary.

use std::collections::{HashMap, HashSet, VecDeque};

use mxf_core::{length, KeyFormat, LenFormat, Ul, Uuid};
use mxf_io::{FileSlot, KlvObject, PositionedFile, SENTINEL_ALL};
use mxf_metadata::{
    registry, DanglingWeakRef, MetadataObject, ObjectId, Primer, Property, PropertyDescriptor, PropertyKind,
    PropertyValue, RefKind, ReferenceResolver, TypeDescriptor, TypeRegistry,
};

use crate::{Error, IndexTableSegment, PartitionPack, Result};

/// Smallest possible Fill item: a 16-byte key and a 1-byte short-form BER
/// length of zero, no value.
const MIN_FILL_KLV_LEN: u64 = 17;

/// A top-level container of metadata, index, and essence (spec §3).
pub struct Partition {
    pub pack: PartitionPack,
    pub primer: Option<Primer>,
    objects: Vec<MetadataObject>,
    resolver: ReferenceResolver,
    /// Sets whose UL had no type descriptor (spec §7 `UnknownUL`): kept
    /// as opaque bytes, never parsed.
    unknown_sets: Vec<(Ul, Vec<u8>)>,
    index_segments: Vec<IndexTableSegment>,
    body_location: Option<i64>,
    next_body_location: Option<i64>,
}

impl Partition {
    pub fn new(pack: PartitionPack) -> Self {
        Self {
            pack,
            primer: None,
            objects: Vec::new(),
            resolver: ReferenceResolver::new(),
            unknown_sets: Vec::new(),
            index_segments: Vec::new(),
            body_location: None,
            next_body_location: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.pack.status.is_closed()
    }

    pub fn is_complete(&self) -> bool {
        self.pack.status.is_complete()
    }

    pub fn close(&mut self) {
        self.pack.status = self.pack.status.close();
    }

    pub fn mark_complete(&mut self) {
        self.pack.status = self.pack.status.complete();
    }

    pub fn all_metadata(&self) -> &[MetadataObject] {
        &self.objects
    }

    pub fn unknown_sets(&self) -> &[(Ul, Vec<u8>)] {
        &self.unknown_sets
    }

    pub fn index_segments(&self) -> &[IndexTableSegment] {
        &self.index_segments
    }

    /// `AllMetadata \ (strong-ref-targets)` (spec §8 "Top-level
    /// computation").
    pub fn top_level_metadata(&self) -> Vec<&MetadataObject> {
        let strong_targets: HashSet<Uuid> =
            self.objects.iter().flat_map(|o| o.strong_ref_targets()).collect();
        self.objects
            .iter()
            .filter(|o| o.instance_uid.map(|u| !strong_targets.contains(&u)).unwrap_or(true))
            .collect()
    }

    /// Drain the reference resolver, surfacing dangling weak refs as
    /// warnings and the first dangling strong ref as a hard error (spec
    /// §4.6 "Two-phase finalisation", §7 `DanglingStrongRef`).
    pub fn finalize_references(&mut self) -> (Vec<DanglingWeakRef>, std::result::Result<(), Error>) {
        let resolver = std::mem::replace(&mut self.resolver, ReferenceResolver::new());
        let (dangling_weak, strong_result) = resolver.finalize();
        (dangling_weak, strong_result.map_err(Error::from))
    }

    /// Read KLV items from the current file position until either `size`
    /// bytes have been consumed or the next KLV is not a header metadata
    /// set (spec §4.7). Returns the number of bytes consumed.
    pub fn read_metadata(
        &mut self,
        file: &mut dyn PositionedFile,
        type_registry: &dyn TypeRegistry,
        size: Option<u64>,
    ) -> Result<u64> {
        let mut consumed = 0u64;
        let mut primer_position_passed = false;

        loop {
            if let Some(limit) = size {
                if consumed >= limit {
                    break;
                }
            }

            let start_pos = file.tell()?;
            let mut kl = KlvObject::new();
            let kl_size = match kl.read_kl(file, KeyFormat::Ul, LenFormat::Ber) {
                Ok(n) => n,
                Err(_) => break,
            };
            let ul = kl.ul().expect("KeyFormat::Ul always yields a UL");
            let value_len = kl.value_len();
            let slot: FileSlot = kl.source().expect("read_kl always sets source");

            if ul.equals_exact(&registry::FILL_ITEM_UL) {
                file.seek_to(slot.value_start() + value_len as i64)?;
                consumed += kl_size as u64 + value_len;
                continue;
            }

            if ul.equals_exact(&registry::PRIMER_PACK_UL) {
                if primer_position_passed {
                    return Err(Error::PrimerOutOfOrder);
                }
                kl.read_data(file, SENTINEL_ALL)?;
                self.primer = Some(Primer::parse(kl.chunk())?);
                primer_position_passed = true;
                consumed += kl_size as u64 + value_len;
                continue;
            }

            if !registry::in_family(&ul, &registry::STRUCTURAL_SET_UL, &registry::STRUCTURAL_SET_FAMILY_MASK) {
                file.seek_to(start_pos)?;
                break;
            }
            primer_position_passed = true;

            kl.read_data(file, SENTINEL_ALL)?;
            match type_registry.lookup(&ul) {
                Some(type_desc) => {
                    let object_id = self.objects.len();
                    let object = self.decode_local_set(type_desc, kl.chunk(), object_id)?;
                    let instance_uid = object.instance_uid;
                    self.objects.push(object);
                    if let Some(uuid) = instance_uid {
                        self.resolver.register_instance(uuid, object_id);
                    }
                }
                None => {
                    tracing::warn!(ul = %ul, "UnknownUL: keeping metadata set opaque");
                    self.unknown_sets.push((ul, kl.chunk().to_vec()));
                }
            }

            consumed += kl_size as u64 + value_len;
        }

        Ok(consumed)
    }

    fn decode_local_set(
        &mut self,
        type_desc: &dyn TypeDescriptor,
        data: &[u8],
        referrer: ObjectId,
    ) -> Result<MetadataObject> {
        let mut obj = MetadataObject::new(type_desc.ul());
        let mut pos = 0usize;

        while pos + 4 <= data.len() {
            let tag = u16::from_be_bytes([data[pos], data[pos + 1]]);
            let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
            pos += 4;
            if pos + len > data.len() {
                break;
            }
            let item = &data[pos..pos + len];
            pos += len;

            let ul = match self.primer.as_ref().and_then(|p| p.lookup_by_tag(tag)) {
                Some(ul) => ul,
                None => {
                    // UnknownTag (spec §7): no primer entry, so there is
                    // no UL identity for this property. Key it by tag
                    // alone so repeats of the same unknown tag still
                    // overwrite rather than accumulate.
                    let mut synthetic = [0u8; 16];
                    synthetic[14..16].copy_from_slice(&tag.to_be_bytes());
                    obj.set_property(Ul::new(synthetic), PropertyValue::Raw(item.to_vec()));
                    continue;
                }
            };

            if type_desc.is_instance_uid_property(&ul) {
                let uuid = parse_uuid(item)?;
                obj.instance_uid = Some(uuid);
                obj.set_property(ul, PropertyValue::Uuid(uuid));
                continue;
            }

            let kind = type_desc.property(&ul).map(|p| p.kind()).unwrap_or(PropertyKind::Raw);
            let value = self.decode_property_value(kind, item, referrer)?;
            obj.set_property(ul, value);
        }

        Ok(obj)
    }

    fn decode_property_value(&mut self, kind: PropertyKind, bytes: &[u8], referrer: ObjectId) -> Result<PropertyValue> {
        use PropertyKind::*;

        let value = match kind {
            UInt8 => PropertyValue::UInt8(bytes.first().copied().unwrap_or(0)),
            UInt16 => PropertyValue::UInt16(u16::from_be_bytes(fixed(bytes, "UInt16 property")?)),
            UInt32 => PropertyValue::UInt32(u32::from_be_bytes(fixed(bytes, "UInt32 property")?)),
            UInt64 => PropertyValue::UInt64(u64::from_be_bytes(fixed(bytes, "UInt64 property")?)),
            Int8 => PropertyValue::Int8(bytes.first().map(|&b| b as i8).unwrap_or(0)),
            Int16 => PropertyValue::Int16(i16::from_be_bytes(fixed(bytes, "Int16 property")?)),
            Int32 => PropertyValue::Int32(i32::from_be_bytes(fixed(bytes, "Int32 property")?)),
            Int64 => PropertyValue::Int64(i64::from_be_bytes(fixed(bytes, "Int64 property")?)),
            FixedString(n) => {
                let n = (n as usize).min(bytes.len());
                let s = String::from_utf8_lossy(&bytes[..n]);
                PropertyValue::String(s.trim_end_matches('\0').to_string())
            }
            Utf16String => {
                let units: Vec<u16> = bytes.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
                PropertyValue::String(String::from_utf16_lossy(&units))
            }
            Timestamp => PropertyValue::Timestamp(mxf_core::Timestamp::decode(bytes)?),
            Ul => PropertyValue::Ul(mxf_core::Ul::from_slice(bytes)?),
            Uuid => PropertyValue::Uuid(parse_uuid(bytes)?),
            StrongRef => {
                let uuid = parse_uuid(bytes)?;
                self.resolver.register_reference(referrer, uuid, RefKind::Strong);
                PropertyValue::StrongRef(uuid)
            }
            WeakRef => {
                let uuid = parse_uuid(bytes)?;
                self.resolver.register_reference(referrer, uuid, RefKind::Weak);
                PropertyValue::WeakRef(uuid)
            }
            Batch | Array => PropertyValue::Array(decode_batch_raw(bytes)?),
            NestedSet => PropertyValue::Nested(Box::new(self.decode_untyped_local_set(bytes)?)),
            Raw => PropertyValue::Raw(bytes.to_vec()),
        };
        Ok(value)
    }

    /// A nested local set has no UL of its own at the outer-KLV level, so
    /// its properties decode with no type descriptor to drive them — each
    /// resolves only as far as the primer, then is kept raw (spec §4.6
    /// "nested local sets").
    fn decode_untyped_local_set(&mut self, data: &[u8]) -> Result<MetadataObject> {
        let mut obj = MetadataObject::new(Ul::new([0u8; 16]));
        let mut pos = 0usize;
        while pos + 4 <= data.len() {
            let tag = u16::from_be_bytes([data[pos], data[pos + 1]]);
            let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
            pos += 4;
            if pos + len > data.len() {
                break;
            }
            let item = &data[pos..pos + len];
            pos += len;
            let ul = match self.primer.as_ref().and_then(|p| p.lookup_by_tag(tag)) {
                Some(ul) => ul,
                None => {
                    let mut synthetic = [0u8; 16];
                    synthetic[14..16].copy_from_slice(&tag.to_be_bytes());
                    obj.set_property(Ul::new(synthetic), PropertyValue::Raw(item.to_vec()));
                    continue;
                }
            };
            obj.set_property(ul, PropertyValue::Raw(item.to_vec()));
        }
        Ok(obj)
    }

    /// Scan for index-table segments (distinguished by UL family) up to
    /// the next partition pack or `byte_limit` (spec §4.7 `ReadIndex`).
    pub fn read_index(&mut self, file: &mut dyn PositionedFile, byte_limit: Option<u64>) -> Result<usize> {
        let mut consumed = 0u64;
        let mut found = 0usize;

        loop {
            if let Some(limit) = byte_limit {
                if consumed >= limit {
                    break;
                }
            }
            let start_pos = file.tell()?;
            let mut kl = KlvObject::new();
            let kl_size = match kl.read_kl(file, KeyFormat::Ul, LenFormat::Ber) {
                Ok(n) => n,
                Err(_) => break,
            };
            let ul = kl.ul().expect("KeyFormat::Ul always yields a UL");
            let value_len = kl.value_len();
            let slot = kl.source().expect("read_kl always sets source");

            if ul.equals_exact(&registry::FILL_ITEM_UL) {
                file.seek_to(slot.value_start() + value_len as i64)?;
                consumed += kl_size as u64 + value_len;
                continue;
            }

            if registry::in_family(&ul, &registry::PARTITION_PACK_UL, &registry::PARTITION_PACK_FAMILY_MASK) {
                file.seek_to(start_pos)?;
                break;
            }

            if !registry::in_family(&ul, &registry::INDEX_TABLE_SEGMENT_UL, &registry::INDEX_TABLE_SEGMENT_FAMILY_MASK)
            {
                file.seek_to(start_pos)?;
                break;
            }

            kl.read_data(file, SENTINEL_ALL)?;
            let segment = IndexTableSegment::decode(kl.chunk())?;
            self.index_segments.push(segment);
            found += 1;
            consumed += kl_size as u64 + value_len;
        }

        Ok(found)
    }

    /// Advance past primer, header metadata, and index tables, stopping
    /// at the first KLV outside those families (spec §4.7 `SeekEssence`).
    /// Returns `false` if no such KLV exists before the next partition
    /// pack.
    pub fn seek_essence(&self, file: &mut dyn PositionedFile) -> Result<bool> {
        loop {
            let start_pos = file.tell()?;
            let mut kl = KlvObject::new();
            if kl.read_kl(file, KeyFormat::Ul, LenFormat::Ber).is_err() {
                return Ok(false);
            }
            let ul = kl.ul().expect("KeyFormat::Ul always yields a UL");
            let value_len = kl.value_len();
            let slot = kl.source().expect("read_kl always sets source");

            if registry::in_family(&ul, &registry::PARTITION_PACK_UL, &registry::PARTITION_PACK_FAMILY_MASK) {
                file.seek_to(start_pos)?;
                return Ok(false);
            }

            let is_metadata_family =
                registry::in_family(&ul, &registry::STRUCTURAL_SET_UL, &registry::STRUCTURAL_SET_FAMILY_MASK);
            let is_index_family = registry::in_family(
                &ul,
                &registry::INDEX_TABLE_SEGMENT_UL,
                &registry::INDEX_TABLE_SEGMENT_FAMILY_MASK,
            );
            let is_fill = ul.equals_exact(&registry::FILL_ITEM_UL);
            let is_primer = ul.equals_exact(&registry::PRIMER_PACK_UL);

            if is_metadata_family || is_index_family || is_fill || is_primer {
                file.seek_to(slot.value_start() + value_len as i64)?;
                continue;
            }

            file.seek_to(start_pos)?;
            return Ok(true);
        }
    }

    /// Position the essence cursor at the first essence KLV (spec §4.7
    /// "Sequential essence iteration").
    pub fn start_elements(&mut self, file: &mut dyn PositionedFile) -> Result<()> {
        if self.seek_essence(file)? {
            let pos = file.tell()?;
            self.body_location = Some(pos);
            self.next_body_location = Some(pos);
        } else {
            self.body_location = None;
            self.next_body_location = None;
        }
        Ok(())
    }

    /// Return a cursor for the current essence element (without
    /// materialising its value) and advance to the next one, skipping a
    /// single interleaved KLV-Fill item — matching the source's
    /// documented limitation of not iterating multiple consecutive fills
    /// (spec §9 "Open question — KLV-Fill at essence iteration").
    /// Returns `None` when no more essence items precede the next
    /// partition pack.
    pub fn next_element(&mut self, file: &mut dyn PositionedFile) -> Result<Option<KlvObject>> {
        let location = match self.next_body_location {
            Some(loc) => loc,
            None => return Ok(None),
        };

        file.seek_to(location)?;
        let mut kl = KlvObject::new();
        if kl.read_kl(file, KeyFormat::Ul, LenFormat::Ber).is_err() {
            self.next_body_location = None;
            return Ok(None);
        }
        let ul = kl.ul().expect("KeyFormat::Ul always yields a UL");
        let value_len = kl.value_len();
        let slot = kl.source().expect("read_kl always sets source");

        if registry::in_family(&ul, &registry::PARTITION_PACK_UL, &registry::PARTITION_PACK_FAMILY_MASK) {
            self.next_body_location = None;
            return Ok(None);
        }

        self.body_location = Some(location);
        let mut after_value = slot.value_start() + value_len as i64;

        file.seek_to(after_value)?;
        let mut maybe_fill = KlvObject::new();
        if maybe_fill.read_kl(file, KeyFormat::Ul, LenFormat::Ber).is_ok() {
            let fill_ul = maybe_fill.ul().expect("KeyFormat::Ul always yields a UL");
            if fill_ul.equals_exact(&registry::FILL_ITEM_UL) {
                let fill_slot = maybe_fill.source().expect("read_kl always sets source");
                after_value = fill_slot.value_start() + maybe_fill.value_len() as i64;
            }
        }

        self.next_body_location = Some(after_value);
        Ok(Some(kl))
    }

    /// Write the primer and every metadata set back out as KLV (spec
    /// §4.6 "Serialisation"): a BFS walk from the top-level objects,
    /// properties in type-descriptor order, strong refs recursing into
    /// their child, weak refs emitting only the target InstanceUID. The
    /// primer is rebuilt from the ULs actually touched during the walk
    /// and written first. Every KLV is padded to the partition's KAG
    /// (spec §6). Returns the number of bytes written.
    pub fn serialize_metadata(
        &mut self,
        file: &mut dyn PositionedFile,
        type_registry: &dyn TypeRegistry,
        partition_start: i64,
    ) -> Result<u64> {
        let order = self.bfs_emission_order();

        let mut primer = Primer::new();
        for &idx in &order {
            self.collect_tags(idx, type_registry, &mut primer)?;
        }

        let start = file.tell()?;

        self.align_to_kag(file, partition_start)?;
        write_klv(file, registry::PRIMER_PACK_UL.as_bytes(), primer.serialize())?;

        for &idx in &order {
            self.align_to_kag(file, partition_start)?;
            let type_ul = self.objects[idx].type_ul;
            let body = self.encode_object(idx, type_registry, &mut primer)?;
            write_klv(file, type_ul.as_bytes(), body)?;
        }

        for (ul, body) in &self.unknown_sets {
            self.align_to_kag(file, partition_start)?;
            write_klv(file, ul.as_bytes(), body.clone())?;
        }

        self.primer = Some(primer);

        let end = file.tell()?;
        Ok((end - start) as u64)
    }

    /// BFS forest walk from the top-level objects (spec §4.6
    /// "Serialisation"): every strong-ref target is visited exactly once,
    /// in the order its owner enqueued it.
    fn bfs_emission_order(&self) -> Vec<ObjectId> {
        let by_uuid: HashMap<Uuid, ObjectId> = self
            .objects
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.instance_uid.map(|u| (u, i)))
            .collect();

        let strong_targets: HashSet<Uuid> = self.objects.iter().flat_map(|o| o.strong_ref_targets()).collect();
        let mut queue: VecDeque<ObjectId> = (0..self.objects.len())
            .filter(|&i| self.objects[i].instance_uid.map(|u| !strong_targets.contains(&u)).unwrap_or(true))
            .collect();
        let mut visited: HashSet<ObjectId> = queue.iter().copied().collect();
        let mut order = Vec::new();

        while let Some(idx) = queue.pop_front() {
            order.push(idx);
            for target in self.objects[idx].strong_ref_targets() {
                if let Some(&child) = by_uuid.get(&target) {
                    if visited.insert(child) {
                        queue.push_back(child);
                    }
                }
            }
        }

        order
    }

    /// First pass over the BFS order: touch every property UL (including
    /// nested-set ones, which share this same primer's tag space) so the
    /// primer is complete before any metadata set is written.
    fn collect_tags(&self, idx: ObjectId, type_registry: &dyn TypeRegistry, primer: &mut Primer) -> Result<()> {
        let obj = &self.objects[idx];
        match type_registry.lookup(&obj.type_ul) {
            Some(type_desc) => {
                for prop in type_desc.properties() {
                    if let Some(value) = obj.property(&prop.ul()) {
                        primer.lookup_by_ul(prop.ul())?;
                        collect_tags_for_value(value, primer)?;
                    }
                }
            }
            None => {
                for prop in &obj.properties {
                    primer.lookup_by_ul(prop.ul)?;
                }
            }
        }
        Ok(())
    }

    /// Turn one object's properties into the inner `tag(2) || len(2) ||
    /// value` stream a local-set KLV's value holds (spec §4.6).
    fn encode_object(&self, idx: ObjectId, type_registry: &dyn TypeRegistry, primer: &mut Primer) -> Result<Vec<u8>> {
        let obj = &self.objects[idx];
        match type_registry.lookup(&obj.type_ul) {
            Some(type_desc) => {
                let mut out = Vec::new();
                for prop in type_desc.properties() {
                    let ul = prop.ul();
                    if let Some(value) = obj.property(&ul) {
                        let tag = primer.lookup_by_ul(ul)?;
                        let bytes = self.encode_property_value(value, prop.kind(), primer)?;
                        append_tagged(&mut out, tag, bytes)?;
                    }
                }
                Ok(out)
            }
            None => self.encode_untyped_local_set(&obj.properties, primer),
        }
    }

    /// The inverse of `decode_untyped_local_set`: every property is
    /// already opaque bytes, so framing is all that is left to do.
    fn encode_untyped_local_set(&self, properties: &[Property], primer: &mut Primer) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for prop in properties {
            let tag = primer.lookup_by_ul(prop.ul)?;
            let bytes = match &prop.value {
                PropertyValue::Raw(bytes) => bytes.clone(),
                _ => return Err(Error::MismatchedPropertyKind("nested set property must be raw")),
            };
            append_tagged(&mut out, tag, bytes)?;
        }
        Ok(out)
    }

    fn encode_property_value(&self, value: &PropertyValue, kind: PropertyKind, primer: &mut Primer) -> Result<Vec<u8>> {
        use PropertyKind::*;
        use PropertyValue as V;

        let mismatch = || Error::MismatchedPropertyKind("stored value does not match descriptor kind");

        let bytes = match (kind, value) {
            (UInt8, V::UInt8(v)) => vec![*v],
            (UInt16, V::UInt16(v)) => v.to_be_bytes().to_vec(),
            (UInt32, V::UInt32(v)) => v.to_be_bytes().to_vec(),
            (UInt64, V::UInt64(v)) => v.to_be_bytes().to_vec(),
            (Int8, V::Int8(v)) => vec![*v as u8],
            (Int16, V::Int16(v)) => v.to_be_bytes().to_vec(),
            (Int32, V::Int32(v)) => v.to_be_bytes().to_vec(),
            (Int64, V::Int64(v)) => v.to_be_bytes().to_vec(),
            (FixedString(n), V::String(s)) => {
                let mut out = s.as_bytes().to_vec();
                out.resize(n as usize, 0);
                out
            }
            (Utf16String, V::String(s)) => s.encode_utf16().flat_map(|u| u.to_be_bytes()).collect(),
            (Timestamp, V::Timestamp(t)) => t.encode().to_vec(),
            (Ul, V::Ul(u)) => u.as_bytes().to_vec(),
            (Uuid, V::Uuid(u)) => u.as_bytes().to_vec(),
            (StrongRef, V::StrongRef(u)) => u.as_bytes().to_vec(),
            (WeakRef, V::WeakRef(u)) => u.as_bytes().to_vec(),
            (Batch | Array, V::Array(items)) => encode_batch_raw(items),
            (NestedSet, V::Nested(nested)) => self.encode_untyped_local_set(&nested.properties, primer)?,
            (Raw, V::Raw(bytes)) => bytes.clone(),
            _ => return Err(mismatch()),
        };
        Ok(bytes)
    }

    /// Pad the file to the next KAG boundary relative to `partition_start`
    /// (spec §6), emitting a single Fill item when padding is needed.
    fn align_to_kag(&self, file: &mut dyn PositionedFile, partition_start: i64) -> Result<()> {
        let offset_in_partition = (file.tell()? - partition_start) as u64;
        let mut pad = self.pack.kag_size.padding_for(offset_in_partition);
        if pad == 0 {
            return Ok(());
        }
        let kag = self.pack.kag_size.get() as u64;
        while pad != 0 && pad < MIN_FILL_KLV_LEN {
            pad += kag;
        }
        let fill = build_fill(pad)?;
        file.write_all_at(&fill)?;
        Ok(())
    }
}

/// Build a Fill item (16-byte key, BER length, zero value) whose encoded
/// size is exactly `total_len` bytes (spec §6).
fn build_fill(total_len: u64) -> Result<Vec<u8>> {
    if total_len < MIN_FILL_KLV_LEN {
        return Err(Error::PaddingTooSmall(total_len));
    }
    for width in 1..=9u64 {
        if total_len < 16 + width {
            break;
        }
        let value_len = total_len - 16 - width;
        if let Ok(len_bytes) = length::encode_ber_fixed(value_len, width as usize) {
            if len_bytes.len() as u64 == width {
                let mut out = Vec::with_capacity(total_len as usize);
                out.extend_from_slice(registry::FILL_ITEM_UL.as_bytes());
                out.extend(len_bytes);
                out.extend(std::iter::repeat(0u8).take(value_len as usize));
                return Ok(out);
            }
        }
    }
    Err(Error::PaddingTooSmall(total_len))
}

/// Append one KLV item to an already-open file, writing sequentially at
/// the file's current position (spec §4.3: a fresh `KlvObject` with no
/// prior source/destination writes at `file.tell()`).
fn write_klv(file: &mut dyn PositionedFile, key: &[u8], value: Vec<u8>) -> Result<u64> {
    let mut kl = KlvObject::new();
    let value_len = value.len() as u64;
    kl.set_value(value);
    kl.write_kl(file, key, 0, Some(value_len))?;
    kl.write_data_from_to(file, 0, 0, value_len)?;
    Ok(value_len)
}

fn append_tagged(out: &mut Vec<u8>, tag: u16, bytes: Vec<u8>) -> Result<()> {
    if bytes.len() > u16::MAX as usize {
        return Err(Error::PropertyTooLarge { len: bytes.len() });
    }
    out.extend(tag.to_be_bytes());
    out.extend((bytes.len() as u16).to_be_bytes());
    out.extend(bytes);
    Ok(())
}

fn collect_tags_for_value(value: &PropertyValue, primer: &mut Primer) -> Result<()> {
    if let PropertyValue::Nested(nested) = value {
        for prop in &nested.properties {
            primer.lookup_by_ul(prop.ul)?;
        }
    }
    Ok(())
}

fn fixed<const N: usize>(bytes: &[u8], what: &'static str) -> Result<[u8; N]> {
    bytes
        .get(..N)
        .and_then(|b| b.try_into().ok())
        .ok_or(Error::Metadata(mxf_metadata::Error::MalformedPrimer(what)))
}

fn parse_uuid(bytes: &[u8]) -> Result<Uuid> {
    let arr: [u8; 16] =
        bytes.try_into().map_err(|_| mxf_core::Error::UnexpectedEof { need: 16, have: bytes.len() })?;
    Ok(Uuid::from_bytes(arr))
}

fn decode_batch_raw(bytes: &[u8]) -> Result<Vec<PropertyValue>> {
    if bytes.len() < 8 {
        return Ok(Vec::new());
    }
    let count = u32::from_be_bytes(bytes[0..4].try_into().unwrap()) as usize;
    let element_size = u32::from_be_bytes(bytes[4..8].try_into().unwrap()) as usize;
    let body = &bytes[8..];
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let start = i * element_size;
        let end = start + element_size;
        if end > body.len() {
            break;
        }
        out.push(PropertyValue::Raw(body[start..end].to_vec()));
    }
    Ok(out)
}

/// The inverse of `decode_batch_raw`: 4-byte count, 4-byte element size,
/// then each element's raw bytes concatenated (spec §4.6 "Batch/Array").
fn encode_batch_raw(items: &[PropertyValue]) -> Vec<u8> {
    let element_size = items
        .iter()
        .find_map(|v| match v {
            PropertyValue::Raw(b) => Some(b.len()),
            _ => None,
        })
        .unwrap_or(0);
    let mut out = Vec::with_capacity(8 + items.len() * element_size);
    out.extend((items.len() as u32).to_be_bytes());
    out.extend((element_size as u32).to_be_bytes());
    for item in items {
        if let PropertyValue::Raw(bytes) = item {
            out.extend_from_slice(bytes);
        }
    }
    out
}
