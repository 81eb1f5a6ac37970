//! Property filter: intersects two `Choice`-shaped values over the same
//! key (§4.D), used during parameter negotiation.
//!
//! Grounded on `fuel-tx`'s policy/predicate intersection helpers for the
//! shape of a pure, allocation-light combinator over two small value
//! sets; the actual combination rules (Enum/Range/Step/Flags) are
//! specified directly by §4.D rather than borrowed from the teacher.

use alloc::vec::Vec;

use crate::error::Error;
use crate::value::{Choice, ChoiceType, PodValue};

/// A value reduced to a comparable numeric key, used only to order and
/// compare `Choice` elements for filtering. Non-numeric element types
/// (`String`, `Bytes`, `Struct`, `Object`, `Array`, `Pointer`) have no
/// ordering and cause [`filter`] to fail with [`Error::Shape`].
fn numeric_key(v: &PodValue) -> Result<f64, Error> {
    Ok(match v {
        PodValue::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        PodValue::Id(n) => *n as f64,
        PodValue::Int(n) => *n as f64,
        PodValue::Long(n) => *n as f64,
        PodValue::Float(n) => *n as f64,
        PodValue::Double(n) => *n,
        _ => {
            return Err(Error::Shape(
                "property filter requires an ordered element type",
            ))
        }
    })
}

/// Builds the canonical `Choice` shape for a filter result: `elements[0]`
/// is the default, forced equal to the first element for `Enum`/`Flags`
/// results and to the computed default for `Range`/`Step`.
fn make_choice(choice_type: ChoiceType, flags: u32, elements: Vec<PodValue>) -> Choice {
    let child_tag = elements
        .first()
        .map(|v| v.tag())
        .unwrap_or(crate::tag::Tag::None);
    Choice {
        choice_type,
        flags,
        child_tag,
        elements,
    }
}

/// Intersects two `Choice`-or-plain-value inputs over the same property,
/// following the uniform `get_values` view (§4.C) so that a bare scalar
/// is treated as `Choice(None, [value])`.
///
/// Returns [`Error::NoIntersection`] when the combination rule in §4.D
/// yields an empty result, and [`Error::Shape`] when the two sides carry
/// incompatible or unordered element types.
pub fn filter(a: &PodValue, b: &PodValue) -> Result<PodValue, Error> {
    let (_, a_type, a_elems) = Choice::uniform_view(a);
    let (_, b_type, b_elems) = Choice::uniform_view(b);

    match (a_type, b_type) {
        (ChoiceType::None, ChoiceType::None) => Ok(a_elems[0].clone()),
        (ChoiceType::None, _) => Ok(wrap(b_type, flags_of(b), b_elems.to_vec())),
        (_, ChoiceType::None) => Ok(wrap(a_type, flags_of(a), a_elems.to_vec())),

        (ChoiceType::Enum, ChoiceType::Enum) => {
            let mut out = Vec::new();
            for x in a_elems {
                if b_elems.iter().any(|y| x == y) {
                    out.push(x.clone());
                }
            }
            if out.is_empty() {
                return Err(Error::NoIntersection);
            }
            Ok(wrap(ChoiceType::Enum, flags_of(a), out))
        }

        (ChoiceType::Range, ChoiceType::Enum) => range_enum(a_elems, b_elems, flags_of(b)),
        (ChoiceType::Enum, ChoiceType::Range) => range_enum(b_elems, a_elems, flags_of(a)),

        (ChoiceType::Range, ChoiceType::Range) => {
            range_range(a_elems, b_elems, flags_of(a)).map(|c| wrap_choice(c))
        }

        (ChoiceType::Step, ChoiceType::Step) => {
            step_step(a_elems, b_elems, flags_of(a)).map(|c| wrap_choice(c))
        }

        (ChoiceType::Flags, ChoiceType::Flags) => {
            let mut out = Vec::new();
            for x in a_elems {
                if b_elems.iter().any(|y| x == y) {
                    out.push(x.clone());
                }
            }
            if out.is_empty() {
                return Err(Error::NoIntersection);
            }
            Ok(wrap(ChoiceType::Flags, flags_of(a), out))
        }

        _ => Err(Error::Shape(
            "property filter does not define a rule for this combination of choice types",
        )),
    }
}

fn flags_of(v: &PodValue) -> u32 {
    match v {
        PodValue::Choice(c) => c.flags,
        _ => 0,
    }
}

fn wrap(choice_type: ChoiceType, flags: u32, elements: Vec<PodValue>) -> PodValue {
    PodValue::Choice(make_choice(choice_type, flags, elements))
}

fn wrap_choice(c: Choice) -> PodValue {
    PodValue::Choice(c)
}

/// `Range` ∩ `Enum`: keep enum elements whose value lies in `[min, max]`.
/// `elements[0]` of the result is whichever kept element matches the
/// enum's own default, or the first surviving element otherwise.
fn range_enum(
    range_elems: &[PodValue],
    enum_elems: &[PodValue],
    flags: u32,
) -> Result<PodValue, Error> {
    if range_elems.len() != 3 {
        return Err(Error::Shape("range choice requires exactly 3 elements"));
    }
    let min = numeric_key(&range_elems[1])?;
    let max = numeric_key(&range_elems[2])?;
    let mut out = Vec::new();
    for e in enum_elems {
        let k = numeric_key(e)?;
        if k >= min && k <= max {
            out.push(e.clone());
        }
    }
    if out.is_empty() {
        return Err(Error::NoIntersection);
    }
    Ok(wrap(ChoiceType::Enum, flags, out))
}

/// `Range` ∩ `Range`: `[max(default1,default2), max(min), min(max)]`;
/// empty if the resulting `min > max`.
fn range_range(a: &[PodValue], b: &[PodValue], flags: u32) -> Result<Choice, Error> {
    if a.len() != 3 || b.len() != 3 {
        return Err(Error::Shape("range choice requires exactly 3 elements"));
    }
    let (d1, min1, max1) = (numeric_key(&a[0])?, numeric_key(&a[1])?, numeric_key(&a[2])?);
    let (d2, min2, max2) = (numeric_key(&b[0])?, numeric_key(&b[1])?, numeric_key(&b[2])?);

    let min = min1.max(min2);
    let max = max1.min(max2);
    if min > max {
        return Err(Error::NoIntersection);
    }
    let default = d1.max(d2).clamp(min, max);

    let as_elem = |k: f64| rebuild_like(&a[0], k);
    Ok(make_choice(
        ChoiceType::Range,
        flags,
        alloc::vec![as_elem(default), as_elem(min), as_elem(max)],
    ))
}

/// `Step` ∩ `Step`: same rule as `Range` over `[default, min, max]`, plus
/// the step from the first operand (§4.D "analogous mono-dimensional
/// rules" — step width is not itself intersected).
fn step_step(a: &[PodValue], b: &[PodValue], flags: u32) -> Result<Choice, Error> {
    if a.len() != 4 || b.len() != 4 {
        return Err(Error::Shape("step choice requires exactly 4 elements"));
    }
    let range_part = range_range(&a[0..3], &b[0..3], flags)?;
    let mut elements = range_part.elements;
    elements.push(a[3].clone());
    Ok(make_choice(ChoiceType::Step, flags, elements))
}

/// Reconstructs a `PodValue` of the same variant as `template` carrying
/// numeric value `k`, used to materialize the computed min/max/default of
/// a `Range`/`Step` intersection.
fn rebuild_like(template: &PodValue, k: f64) -> PodValue {
    match template {
        PodValue::Bool(_) => PodValue::Bool(k != 0.0),
        PodValue::Id(_) => PodValue::Id(k as u32),
        PodValue::Int(_) => PodValue::Int(k as i32),
        PodValue::Long(_) => PodValue::Long(k as i64),
        PodValue::Float(_) => PodValue::Float(k as f32),
        PodValue::Double(_) => PodValue::Double(k),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_intersection_preserves_first_operand_order() {
        let a = PodValue::Choice(Choice {
            choice_type: ChoiceType::Enum,
            flags: 0,
            child_tag: crate::tag::Tag::Int,
            elements: alloc::vec![PodValue::Int(1), PodValue::Int(2), PodValue::Int(3)],
        });
        let b = PodValue::Choice(Choice {
            choice_type: ChoiceType::Enum,
            flags: 0,
            child_tag: crate::tag::Tag::Int,
            elements: alloc::vec![PodValue::Int(3), PodValue::Int(1)],
        });
        let result = filter(&a, &b).unwrap();
        match result {
            PodValue::Choice(c) => {
                assert_eq!(c.elements, alloc::vec![PodValue::Int(1), PodValue::Int(3)]);
            }
            _ => panic!("expected a choice"),
        }
    }

    #[test]
    fn scenario_5_choice_filter_empty() {
        let enum_choice = PodValue::Choice(Choice {
            choice_type: ChoiceType::Enum,
            flags: 0,
            child_tag: crate::tag::Tag::Int,
            elements: alloc::vec![PodValue::Int(48000), PodValue::Int(44100)],
        });
        let range_choice = PodValue::Choice(Choice {
            choice_type: ChoiceType::Range,
            flags: 0,
            child_tag: crate::tag::Tag::Int,
            elements: alloc::vec![PodValue::Int(96000), PodValue::Int(88200), PodValue::Int(192000)],
        });
        let err = filter(&enum_choice, &range_choice).unwrap_err();
        assert_eq!(err, Error::NoIntersection);
    }

    #[test]
    fn range_range_picks_tighter_bounds() {
        let a = PodValue::Choice(Choice {
            choice_type: ChoiceType::Range,
            flags: 0,
            child_tag: crate::tag::Tag::Int,
            elements: alloc::vec![PodValue::Int(10), PodValue::Int(0), PodValue::Int(20)],
        });
        let b = PodValue::Choice(Choice {
            choice_type: ChoiceType::Range,
            flags: 0,
            child_tag: crate::tag::Tag::Int,
            elements: alloc::vec![PodValue::Int(5), PodValue::Int(-5), PodValue::Int(15)],
        });
        let result = filter(&a, &b).unwrap();
        match result {
            PodValue::Choice(c) => {
                assert_eq!(
                    c.elements,
                    alloc::vec![PodValue::Int(10), PodValue::Int(0), PodValue::Int(15)]
                );
            }
            _ => panic!("expected a choice"),
        }
    }

    #[test]
    fn none_side_is_absorbed_by_the_other() {
        let plain = PodValue::Int(7);
        let enumerated = PodValue::Choice(Choice {
            choice_type: ChoiceType::Enum,
            flags: 0,
            child_tag: crate::tag::Tag::Int,
            elements: alloc::vec![PodValue::Int(1), PodValue::Int(2)],
        });
        let result = filter(&plain, &enumerated).unwrap();
        assert_eq!(result, enumerated);

        let both_plain = filter(&PodValue::Int(3), &PodValue::Int(3)).unwrap();
        assert_eq!(both_plain, PodValue::Int(3));
    }

    #[test]
    fn filter_is_commutative_modulo_order() {
        let a = PodValue::Choice(Choice {
            choice_type: ChoiceType::Enum,
            flags: 0,
            child_tag: crate::tag::Tag::Int,
            elements: alloc::vec![PodValue::Int(1), PodValue::Int(2)],
        });
        let b = PodValue::Choice(Choice {
            choice_type: ChoiceType::Enum,
            flags: 0,
            child_tag: crate::tag::Tag::Int,
            elements: alloc::vec![PodValue::Int(2), PodValue::Int(1)],
        });
        let ab = filter(&a, &b).unwrap();
        let ba = filter(&b, &a).unwrap();
        let elems_of = |v: PodValue| match v {
            PodValue::Choice(c) => {
                let mut e = c.elements;
                e.sort_by_key(|x| match x {
                    PodValue::Int(n) => *n,
                    _ => 0,
                });
                e
            }
            _ => panic!("expected choice"),
        };
        assert_eq!(elems_of(ab), elems_of(ba));
    }
}
