//! End-to-end coverage of the literal scenarios in §8, driven entirely
//! through the public API rather than `pod_core`'s internal unit tests.

use pod_core::builder::Builder;
use pod_core::parser::{ContainerInfo, Parser};
use pod_core::value::ChoiceType;
use pod_core::{filter, Error, PodValue, Tag};

#[test]
fn scenario_1_primitive_round_trip() {
    let mut buf = [0u8; 256];
    let mut b = Builder::new(&mut buf);
    b.open_struct().unwrap();
    b.primitive(Tag::Int, &4i32.to_le_bytes()).unwrap();
    b.primitive(Tag::Long, &6000i64.to_le_bytes()).unwrap();
    b.primitive(Tag::Float, &4.0f32.to_le_bytes()).unwrap();
    b.primitive(Tag::Double, &3.14f64.to_le_bytes()).unwrap();
    let mut s = b"test123".to_vec();
    s.push(0);
    b.primitive(Tag::String, &s).unwrap();
    b.primitive(
        Tag::Rectangle,
        &[320u32.to_le_bytes(), 240u32.to_le_bytes()].concat(),
    )
    .unwrap();
    b.primitive(
        Tag::Fraction,
        &[25u32.to_le_bytes(), 1u32.to_le_bytes()].concat(),
    )
    .unwrap();
    b.open_array(Tag::Int, 4).unwrap();
    for v in [4i32, 5, 6] {
        b.primitive(Tag::Int, &v.to_le_bytes()).unwrap();
    }
    b.close().unwrap();
    b.close().unwrap();
    let len = b.len();

    let mut p = Parser::new(&buf[..len]);
    p.enter().unwrap();
    assert_eq!(p.get_i32().unwrap(), 4);
    assert_eq!(p.get_i64().unwrap(), 6000);
    assert_eq!(p.get_f32().unwrap(), 4.0);
    assert_eq!(p.get_f64().unwrap(), 3.14);
    assert_eq!(p.get_str().unwrap(), "test123");
    assert_eq!(p.get_rectangle().unwrap(), (320, 240));
    assert_eq!(p.get_fraction().unwrap(), (25, 1));
    let info = p.enter().unwrap();
    assert_eq!(
        info,
        ContainerInfo::Array {
            child_tag: Tag::Int,
            child_size: 4,
        }
    );
    assert_eq!(p.get_i32().unwrap(), 4);
    assert_eq!(p.get_i32().unwrap(), 5);
    assert_eq!(p.get_i32().unwrap(), 6);
    assert_eq!(p.next().unwrap(), None);
    p.leave().unwrap();
    p.leave().unwrap();
}

#[test]
fn scenario_2_object_property_lookup() {
    let mut buf = [0u8; 512];
    let mut b = Builder::new(&mut buf);
    b.open_object(0, 0).unwrap();

    b.open_property(1, 0).unwrap();
    b.open_choice(ChoiceType::Enum, 0).unwrap();
    b.primitive(Tag::Int, &1i32.to_le_bytes()).unwrap();
    b.primitive(Tag::Int, &2i32.to_le_bytes()).unwrap();
    b.close().unwrap();
    b.close().unwrap();

    b.open_property(2, 0).unwrap();
    b.primitive(Tag::Int, &42i32.to_le_bytes()).unwrap();
    b.close().unwrap();

    b.open_property(3, 0).unwrap();
    b.open_choice(ChoiceType::Range, 0).unwrap();
    for rect in [(320u32, 240u32), (0, 0), (1024, 1024)] {
        b.primitive(
            Tag::Rectangle,
            &[rect.0.to_le_bytes(), rect.1.to_le_bytes()].concat(),
        )
        .unwrap();
    }
    b.close().unwrap();
    b.close().unwrap();

    b.close().unwrap();
    let len = b.len();

    let mut p = Parser::new(&buf[..len]);
    p.enter().unwrap();
    let prop = p.find_prop(2).unwrap().expect("property 2 must be present");
    assert_eq!(prop.key, 2);
    let mut value = prop.value;
    assert_eq!(value.get_i32().unwrap(), 42);
}

#[test]
fn scenario_3_malformed_rejection() {
    let mut buf = [0u8; 16];
    buf[0..4].copy_from_slice(&1000u32.to_le_bytes());
    buf[4..8].copy_from_slice(&(Tag::Int as u32).to_le_bytes());
    let p = Parser::new(&buf);
    let err = p.peek_type().unwrap_err();
    assert!(matches!(err, Error::Malformed { offset: 0, .. }));
}

#[test]
fn scenario_5_choice_filter_empty() {
    let enum_choice = PodValue::Choice(pod_core::Choice {
        choice_type: ChoiceType::Enum,
        flags: 0,
        child_tag: Tag::Int,
        elements: vec![PodValue::Int(48000), PodValue::Int(44100)],
    });
    let range_choice = PodValue::Choice(pod_core::Choice {
        choice_type: ChoiceType::Range,
        flags: 0,
        child_tag: Tag::Int,
        elements: vec![PodValue::Int(96000), PodValue::Int(88200), PodValue::Int(192000)],
    });
    let err = filter(&enum_choice, &range_choice).unwrap_err();
    assert_eq!(err, Error::NoIntersection);
}

#[test]
fn scenario_6_overflow_retry() {
    let mut small = [0u8; 32];
    let mut b = Builder::new(&mut small);
    b.open_struct().unwrap();
    b.primitive(Tag::Int, &4i32.to_le_bytes()).unwrap();
    b.primitive(Tag::Long, &6000i64.to_le_bytes()).unwrap();
    b.primitive(Tag::Float, &4.0f32.to_le_bytes()).unwrap();
    b.primitive(Tag::Double, &3.14f64.to_le_bytes()).unwrap();
    let mut s = b"test123".to_vec();
    s.push(0);
    b.primitive(Tag::String, &s).unwrap();
    b.primitive(
        Tag::Rectangle,
        &[320u32.to_le_bytes(), 240u32.to_le_bytes()].concat(),
    )
    .unwrap();
    b.primitive(
        Tag::Fraction,
        &[25u32.to_le_bytes(), 1u32.to_le_bytes()].concat(),
    )
    .unwrap();
    b.open_array(Tag::Int, 4).unwrap();
    for v in [4i32, 5, 6] {
        b.primitive(Tag::Int, &v.to_le_bytes()).unwrap();
    }
    b.close().unwrap();
    let required = match b.close().unwrap_err() {
        Error::Overflow { required } => required,
        other => panic!("expected overflow, got {other:?}"),
    };

    let mut big = vec![0u8; required];
    let mut b2 = Builder::new(&mut big);
    b2.open_struct().unwrap();
    b2.primitive(Tag::Int, &4i32.to_le_bytes()).unwrap();
    b2.primitive(Tag::Long, &6000i64.to_le_bytes()).unwrap();
    b2.primitive(Tag::Float, &4.0f32.to_le_bytes()).unwrap();
    b2.primitive(Tag::Double, &3.14f64.to_le_bytes()).unwrap();
    let mut s = b"test123".to_vec();
    s.push(0);
    b2.primitive(Tag::String, &s).unwrap();
    b2.primitive(
        Tag::Rectangle,
        &[320u32.to_le_bytes(), 240u32.to_le_bytes()].concat(),
    )
    .unwrap();
    b2.primitive(
        Tag::Fraction,
        &[25u32.to_le_bytes(), 1u32.to_le_bytes()].concat(),
    )
    .unwrap();
    b2.open_array(Tag::Int, 4).unwrap();
    for v in [4i32, 5, 6] {
        b2.primitive(Tag::Int, &v.to_le_bytes()).unwrap();
    }
    b2.close().unwrap();
    b2.close().unwrap();
    let len = b2.len();
    assert_eq!(len, required);

    let mut p = Parser::new(&big[..len]);
    p.enter().unwrap();
    assert_eq!(p.get_i32().unwrap(), 4);
    assert_eq!(p.get_i64().unwrap(), 6000);
}
