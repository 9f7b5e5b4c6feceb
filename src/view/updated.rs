use crate::{
    point::{Attribute, Format, Value},
    raw,
    view::{owned::out_of_bounds, PointView},
    Color, Error, Result,
};

/// A column of replacement values for one attribute.
///
/// Overlays work in the same value space as [Attribute::read]: raw i32
/// coordinates, u16 intensities, degrees for the scan angle. The container
/// layer is responsible for descaling cooked coordinates before building an
/// overlay.
#[derive(Clone, Debug)]
pub struct AttributeOverlay {
    attribute: Attribute,
    values: Vec<Value>,
}

impl AttributeOverlay {
    /// Creates an overlay column.
    ///
    /// Every value must have the kind that the attribute decodes to; mixed or
    /// mistyped columns are rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::point::{Attribute, Format, Value};
    /// use pointclouds::view::AttributeOverlay;
    /// let format = Format::default();
    /// let overlay = AttributeOverlay::new(
    ///     Attribute::Intensity,
    ///     vec![Value::U16(1), Value::U16(2)],
    ///     &format,
    /// )
    /// .unwrap();
    /// assert!(AttributeOverlay::new(
    ///     Attribute::Intensity,
    ///     vec![Value::F64(1.)],
    ///     &format,
    /// )
    /// .is_err());
    /// ```
    pub fn new(attribute: Attribute, values: Vec<Value>, format: &Format) -> Result<AttributeOverlay> {
        let expected = attribute
            .kind(format)
            .ok_or(Error::MissingAttribute {
                attribute,
                format: *format,
            })?;
        if let Some(value) = values.iter().find(|value| value.kind() != expected) {
            return Err(Error::OverlayKind {
                attribute,
                expected,
                actual: value.kind(),
            });
        }
        Ok(AttributeOverlay { attribute, values })
    }

    /// Returns the attribute this overlay replaces.
    pub fn attribute(&self) -> Attribute {
        self.attribute
    }

    /// Returns the number of values.
    pub fn len(&self) -> u64 {
        self.values.len() as u64
    }

    /// Returns true if the overlay is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn apply(&self, index: u64, point: &mut raw::Point, format: &Format) {
        let value = &self.values[index as usize];
        apply_value(point, self.attribute, value, format);
    }
}

/// An attribute-override view: records come from the parent, but the listed
/// attributes are replaced by overlay columns at the same index.
#[derive(Clone, Debug)]
pub struct Updated<V> {
    parent: V,
    overlays: Vec<AttributeOverlay>,
}

impl<V: PointView> Updated<V> {
    /// Creates an updated view.
    ///
    /// Every overlay must be exactly as long as the parent.
    pub fn new(parent: V, overlays: Vec<AttributeOverlay>) -> Result<Updated<V>> {
        for overlay in &overlays {
            if overlay.len() != parent.len() {
                return Err(Error::OverlayLength {
                    attribute: overlay.attribute,
                    expected: parent.len(),
                    actual: overlay.len(),
                });
            }
        }
        Ok(Updated { parent, overlays })
    }

    /// Does this view override the given attribute?
    pub fn overrides(&self, attribute: Attribute) -> bool {
        self.overlays
            .iter()
            .any(|overlay| overlay.attribute == attribute)
    }

    /// Returns a reference to the parent view.
    pub fn parent(&self) -> &V {
        &self.parent
    }
}

impl<V: PointView> PointView for Updated<V> {
    fn len(&self) -> u64 {
        self.parent.len()
    }

    fn format(&self) -> Format {
        self.parent.format()
    }

    fn read(&self, index: u64) -> Result<raw::Point> {
        if index >= self.len() {
            return Err(out_of_bounds(index, self.len()));
        }
        let format = self.format();
        let mut point = self.parent.read(index)?;
        for overlay in &self.overlays {
            overlay.apply(index, &mut point, &format);
        }
        Ok(point)
    }
}

/// Writes one overlay value into a raw record.
///
/// The value kind was checked at overlay construction, so mismatches here
/// are unreachable and ignored.
fn apply_value(point: &mut raw::Point, attribute: Attribute, value: &Value, format: &Format) {
    match (attribute, value) {
        (Attribute::X, Value::I32(n)) => point.x = *n,
        (Attribute::Y, Value::I32(n)) => point.y = *n,
        (Attribute::Z, Value::I32(n)) => point.z = *n,
        (Attribute::Intensity, Value::U16(n)) => point.intensity = *n,
        (Attribute::ReturnNumber, Value::U8(n)) => match &mut point.flags {
            raw::Flags::TwoByte(a, _) => *a = (*a & !0x7) | (n & 0x7),
            raw::Flags::ThreeByte(a, _, _) => *a = (*a & !0xf) | (n & 0xf),
        },
        (Attribute::NumberOfReturns, Value::U8(n)) => match &mut point.flags {
            raw::Flags::TwoByte(a, _) => *a = (*a & !0x38) | ((n & 0x7) << 3),
            raw::Flags::ThreeByte(a, _, _) => *a = (*a & 0xf) | (n << 4),
        },
        (Attribute::ScanDirection, Value::U8(n)) => {
            let bit = (n & 1) << 6;
            match &mut point.flags {
                raw::Flags::TwoByte(a, _) => *a = (*a & !0x40) | bit,
                raw::Flags::ThreeByte(_, b, _) => *b = (*b & !0x40) | bit,
            }
        }
        (Attribute::IsEdgeOfFlightLine, Value::Bool(set)) => match &mut point.flags {
            raw::Flags::TwoByte(a, _) => {
                if *set {
                    *a |= 0x80;
                } else {
                    *a &= !0x80;
                }
            }
            raw::Flags::ThreeByte(_, b, _) => {
                if *set {
                    *b |= 0x80;
                } else {
                    *b &= !0x80;
                }
            }
        },
        (Attribute::Classification, Value::U8(n)) => match &mut point.flags {
            raw::Flags::TwoByte(_, b) => *b = (*b & !0x1f) | (n & 0x1f),
            raw::Flags::ThreeByte(_, _, c) => *c = *n,
        },
        (Attribute::IsSynthetic, Value::Bool(set)) => set_class_bit(point, 0x20, 1, *set),
        (Attribute::IsKeyPoint, Value::Bool(set)) => set_class_bit(point, 0x40, 2, *set),
        (Attribute::IsWithheld, Value::Bool(set)) => set_class_bit(point, 0x80, 4, *set),
        (Attribute::IsOverlap, Value::Bool(set)) => match &mut point.flags {
            raw::Flags::TwoByte(_, b) => {
                if *set {
                    *b = (*b & !0x1f) | 12;
                } else if *b & 0x1f == 12 {
                    *b &= !0x1f;
                }
            }
            raw::Flags::ThreeByte(_, b, _) => {
                if *set {
                    *b |= 8;
                } else {
                    *b &= !8;
                }
            }
        },
        (Attribute::ScannerChannel, Value::U8(n)) => {
            if let raw::Flags::ThreeByte(_, b, _) = &mut point.flags {
                *b = (*b & !0x30) | ((n & 3) << 4);
            }
        }
        (Attribute::ScanAngle, Value::F32(degrees)) => {
            point.scan_angle = raw::ScanAngle::from_degrees(*degrees, format.is_extended);
        }
        (Attribute::UserData, Value::U8(n)) => point.user_data = *n,
        (Attribute::PointSourceId, Value::U16(n)) => point.point_source_id = *n,
        (Attribute::GpsTime, Value::F64(n)) => point.gps_time = Some(*n),
        (Attribute::Red, Value::U16(n)) => {
            point.color.get_or_insert_with(Color::default).red = *n;
        }
        (Attribute::Green, Value::U16(n)) => {
            point.color.get_or_insert_with(Color::default).green = *n;
        }
        (Attribute::Blue, Value::U16(n)) => {
            point.color.get_or_insert_with(Color::default).blue = *n;
        }
        (Attribute::Nir, Value::U16(n)) => point.nir = Some(*n),
        _ => unreachable!("overlay kinds are checked at construction"),
    }
}

fn set_class_bit(point: &mut raw::Point, legacy: u8, extended: u8, set: bool) {
    match &mut point.flags {
        raw::Flags::TwoByte(_, b) => {
            if set {
                *b |= legacy;
            } else {
                *b &= !legacy;
            }
        }
        raw::Flags::ThreeByte(_, b, _) => {
            if set {
                *b |= extended;
            } else {
                *b &= !extended;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::OwnedPoints;

    fn parent() -> OwnedPoints {
        let points = (0..4)
            .map(|x| raw::Point {
                x,
                intensity: 10,
                ..Default::default()
            })
            .collect();
        OwnedPoints::new(points, Format::default())
    }

    #[test]
    fn overrides_listed_attribute() {
        let format = Format::default();
        let overlay = AttributeOverlay::new(
            Attribute::Intensity,
            (0..4).map(Value::U16).collect(),
            &format,
        )
        .unwrap();
        let updated = Updated::new(parent(), vec![overlay]).unwrap();
        for index in 0..4 {
            let point = updated.read(index).unwrap();
            assert_eq!(index as u16, point.intensity);
            assert_eq!(index as i32, point.x);
        }
    }

    #[test]
    fn wrong_length() {
        let format = Format::default();
        let overlay =
            AttributeOverlay::new(Attribute::Intensity, vec![Value::U16(0)], &format).unwrap();
        assert!(Updated::new(parent(), vec![overlay]).is_err());
    }

    #[test]
    fn missing_attribute() {
        let format = Format::default();
        assert!(AttributeOverlay::new(Attribute::GpsTime, vec![Value::F64(0.)], &format).is_err());
    }

    #[test]
    fn flag_overlays() {
        let format = Format::default();
        let overlay = AttributeOverlay::new(
            Attribute::IsWithheld,
            vec![Value::Bool(true); 4],
            &format,
        )
        .unwrap();
        let updated = Updated::new(parent(), vec![overlay]).unwrap();
        assert!(updated.read(0).unwrap().flags.is_withheld());
    }

    #[test]
    fn return_number_overlay() {
        let format = Format::default();
        let overlay = AttributeOverlay::new(
            Attribute::ReturnNumber,
            vec![Value::U8(3); 4],
            &format,
        )
        .unwrap();
        let updated = Updated::new(parent(), vec![overlay]).unwrap();
        assert_eq!(3, updated.read(2).unwrap().flags.return_number());
    }
}
