//! Tests for capability document parsing and cell selection

use super::*;
use crate::error::TunerError;

const TWO_CELL_CAPS: &str = r#"<capabilities>
  <host>
    <uuid>3bd1c3c4-4f7a-4c0b-9a52-0f1f5c6c8e11</uuid>
    <cpu>
      <arch>x86_64</arch>
      <model>Skylake-Server-IBRS</model>
      <vendor>Intel</vendor>
      <topology sockets='1' dies='1' cores='2' threads='2'/>
    </cpu>
    <iommu support='yes'/>
    <topology>
      <cells num='2'>
        <cell id='0'>
          <memory unit='KiB'>65713256</memory>
          <pages unit='KiB' size='4'>16428314</pages>
          <pages unit='KiB' size='2048'>0</pages>
          <distances>
            <sibling id='0' value='10'/>
            <sibling id='1' value='21'/>
          </distances>
          <cpus num='2'>
            <cpu id='0' socket_id='0' die_id='0' core_id='0' siblings='0,2'/>
            <cpu id='2' socket_id='0' die_id='0' core_id='1' siblings='0,2'/>
          </cpus>
        </cell>
        <cell id='1'>
          <memory unit='KiB'>66055980</memory>
          <cpus num='3'>
            <cpu id='1' socket_id='1' die_id='0' core_id='0' siblings='1,3'/>
            <cpu id='3' socket_id='1' die_id='0' core_id='1' siblings='1,3'/>
            <cpu id='5' socket_id='1' die_id='0' core_id='2' siblings='5'/>
          </cpus>
        </cell>
      </cells>
    </topology>
    <secmodel>
      <model>selinux</model>
      <doi>0</doi>
    </secmodel>
    <secmodel>
      <model>dac</model>
      <doi>0</doi>
    </secmodel>
  </host>
  <guest>
    <os_type>hvm</os_type>
  </guest>
</capabilities>
"#;

#[test]
fn test_parse_cells_in_document_order() {
    let topology = parse_capabilities(TWO_CELL_CAPS.as_bytes()).unwrap();

    assert_eq!(topology.len(), 2);
    assert_eq!(topology.cells()[0].id, Some(0));
    assert_eq!(topology.cells()[0].cpu_ids(), vec![0, 2]);
    assert_eq!(topology.cells()[1].id, Some(1));
    assert_eq!(topology.cells()[1].cpu_ids(), vec![1, 3, 5]);
    assert_eq!(topology.cpu_count(), 5);
}

#[test]
fn test_parse_cpu_attributes() {
    let topology = parse_capabilities(TWO_CELL_CAPS.as_bytes()).unwrap();
    let cpu = &topology.cells()[1].cpus[2];

    assert_eq!(cpu.id, 5);
    assert_eq!(cpu.socket_id, Some(1));
    assert_eq!(cpu.core_id, Some(2));
    assert_eq!(cpu.siblings.as_deref(), Some("5"));
}

#[test]
fn test_parse_generated_document_preserves_counts() {
    // Cells of varying size with CPU ids numbered across the whole host
    let sizes = [1usize, 4, 0, 7];
    let mut xml = String::from("<capabilities><host><topology><cells>");
    let mut next_id = 0u32;
    let mut expected = Vec::new();
    for (cell, size) in sizes.iter().enumerate() {
        xml.push_str(&format!("<cell id='{}'><cpus num='{}'>", cell, size));
        let mut ids = Vec::new();
        for _ in 0..*size {
            xml.push_str(&format!("<cpu id='{}'/>", next_id));
            ids.push(next_id);
            next_id += 1;
        }
        xml.push_str("</cpus></cell>");
        expected.push(ids);
    }
    xml.push_str("</cells></topology></host></capabilities>");

    let topology = parse_capabilities(xml.as_bytes()).unwrap();
    assert_eq!(topology.len(), sizes.len());
    for (cell, ids) in topology.cells().iter().zip(expected) {
        assert_eq!(cell.cpu_ids(), ids);
    }
}

#[test]
fn test_missing_numa_section_is_empty() {
    let doc = "<capabilities><host><uuid>abc</uuid></host></capabilities>";
    let topology = parse_capabilities(doc.as_bytes()).unwrap();
    assert!(topology.is_empty());
}

#[test]
fn test_missing_host_is_empty() {
    let topology = parse_capabilities(b"<capabilities/>").unwrap();
    assert!(topology.is_empty());
}

#[test]
fn test_cell_without_cpus() {
    let doc = "<capabilities><host><topology><cells num='1'><cell id='0'/></cells></topology></host></capabilities>";
    let topology = parse_capabilities(doc.as_bytes()).unwrap();
    assert_eq!(topology.len(), 1);
    assert!(topology.cells()[0].cpus.is_empty());
}

#[test]
fn test_mismatched_tags_are_malformed() {
    let doc = "<capabilities><host><topology></host></capabilities>";
    let err = parse_capabilities(doc.as_bytes()).unwrap_err();
    assert!(matches!(err, TunerError::MalformedCapabilityDocument(_)));
}

#[test]
fn test_non_numeric_cpu_id_is_malformed() {
    let doc = "<capabilities><host><topology><cells><cell id='0'><cpus><cpu id='x'/></cpus></cell></cells></topology></host></capabilities>";
    let err = parse_capabilities(doc.as_bytes()).unwrap_err();
    assert!(matches!(err, TunerError::MalformedCapabilityDocument(_)));
}

#[test]
fn test_invalid_utf8_is_malformed() {
    let err = parse_capabilities(&[0x3c, 0xff, 0xfe, 0x3e]).unwrap_err();
    assert!(matches!(err, TunerError::MalformedCapabilityDocument(_)));
}

#[test]
fn test_empty_document_is_malformed() {
    let err = parse_capabilities(b"").unwrap_err();
    assert!(matches!(err, TunerError::MalformedCapabilityDocument(_)));
}

#[test]
fn test_last_cell_policy() {
    let topology = NumaTopology::from_cpu_lists(&[&[0, 1], &[2, 3], &[4, 5, 6]]);
    let cell = ReservationPolicy::LastCell.select(&topology).unwrap();
    assert_eq!(cell.cpu_ids(), vec![4, 5, 6]);
}

#[test]
fn test_indexed_cell_policy() {
    let topology = NumaTopology::from_cpu_lists(&[&[0, 1], &[2, 3]]);
    let cell = ReservationPolicy::Cell(0).select(&topology).unwrap();
    assert_eq!(cell.cpu_ids(), vec![0, 1]);

    let err = ReservationPolicy::Cell(2).select(&topology).unwrap_err();
    assert!(matches!(err, TunerError::CellOutOfRange { index: 2, cells: 2 }));
}

#[test]
fn test_any_policy_rejects_empty_topology() {
    let empty = NumaTopology::default();
    assert!(matches!(
        ReservationPolicy::LastCell.select(&empty),
        Err(TunerError::NoNumaTopology)
    ));
    assert!(matches!(
        ReservationPolicy::Cell(0).select(&empty),
        Err(TunerError::NoNumaTopology)
    ));
}

#[test]
fn test_policy_from_str() {
    assert_eq!("last".parse::<ReservationPolicy>().unwrap(), ReservationPolicy::LastCell);
    assert_eq!("LAST".parse::<ReservationPolicy>().unwrap(), ReservationPolicy::LastCell);
    assert_eq!("1".parse::<ReservationPolicy>().unwrap(), ReservationPolicy::Cell(1));
    assert!("first".parse::<ReservationPolicy>().is_err());
    assert_eq!(ReservationPolicy::Cell(3).to_string(), "3");
}
