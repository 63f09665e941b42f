//! Helpers around smithay's geometry and serial types
//!
//! All coordinates are logical. Global coordinates span the whole compositor
//! space; output-local coordinates are relative to an output's top-left.

use smithay::utils::{Logical, Point, Rectangle, Serial, Size};

/// Monotonic serial source, one per shell instance
#[derive(Debug)]
pub struct SerialCounter {
    next: u32,
}

impl Default for SerialCounter {
    fn default() -> Self {
        SerialCounter { next: 1 }
    }
}

impl SerialCounter {
    pub fn next_serial(&mut self) -> Serial {
        let serial = Serial::from(self.next);
        self.next = self.next.wrapping_add(1);
        // zero is reserved as "no serial" on the wire
        if self.next == 0 {
            self.next = 1;
        }
        serial
    }

    /// Most recently issued serial, if any
    pub fn last(&self) -> Option<Serial> {
        let last = self.next.wrapping_sub(1);
        (last != 0).then(|| Serial::from(last))
    }
}

/// Clamp a raw width and height into `[min, max]`, treating a zero max as unbounded
pub fn clamp_size(w: i32, h: i32, min: Size<i32, Logical>, max: Size<i32, Logical>) -> Size<i32, Logical> {
    let max_w = if max.w <= 0 { i32::MAX } else { max.w };
    let max_h = if max.h <= 0 { i32::MAX } else { max.h };
    Size::from((w.min(max_w).max(min.w).max(0), h.min(max_h).max(min.h).max(0)))
}

pub fn area(rect: &Rectangle<i32, Logical>) -> i64 {
    rect.size.w.max(0) as i64 * rect.size.h.max(0) as i64
}

pub fn center(rect: &Rectangle<i32, Logical>) -> Point<i32, Logical> {
    Point::from((rect.loc.x + rect.size.w / 2, rect.loc.y + rect.size.h / 2))
}

/// Serde adapters keeping the JSON shape of geometry and serials stable
///
/// Points are `{"x","y"}`, sizes `{"w","h"}`, rectangles `{"loc","size"}` and
/// serials plain numbers.
pub mod wire {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use smithay::utils::{Logical, Point, Rectangle, Serial, Size};

    #[derive(Serialize, Deserialize)]
    struct PointRepr {
        x: i32,
        y: i32,
    }

    #[derive(Serialize, Deserialize)]
    struct SizeRepr {
        w: i32,
        h: i32,
    }

    #[derive(Serialize, Deserialize)]
    struct RectRepr {
        loc: PointRepr,
        size: SizeRepr,
    }

    impl From<Rectangle<i32, Logical>> for RectRepr {
        fn from(rect: Rectangle<i32, Logical>) -> Self {
            RectRepr {
                loc: PointRepr {
                    x: rect.loc.x,
                    y: rect.loc.y,
                },
                size: SizeRepr {
                    w: rect.size.w,
                    h: rect.size.h,
                },
            }
        }
    }

    fn non_negative<E: serde::de::Error>(w: i32, h: i32) -> Result<Size<i32, Logical>, E> {
        if w < 0 || h < 0 {
            return Err(E::custom(format!("negative size {w}x{h}")));
        }
        Ok(Size::from((w, h)))
    }

    fn to_rect<E: serde::de::Error>(repr: RectRepr) -> Result<Rectangle<i32, Logical>, E> {
        let size = non_negative(repr.size.w, repr.size.h)?;
        Ok(Rectangle::new((repr.loc.x, repr.loc.y).into(), size))
    }

    pub fn origin() -> Point<i32, Logical> {
        Point::from((0, 0))
    }

    pub mod point {
        use super::*;

        pub fn serialize<S: Serializer>(point: &Point<i32, Logical>, s: S) -> Result<S::Ok, S::Error> {
            PointRepr {
                x: point.x,
                y: point.y,
            }
            .serialize(s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Point<i32, Logical>, D::Error> {
            let repr = PointRepr::deserialize(d)?;
            Ok(Point::from((repr.x, repr.y)))
        }
    }

    pub mod size {
        use super::*;

        pub fn serialize<S: Serializer>(size: &Size<i32, Logical>, s: S) -> Result<S::Ok, S::Error> {
            SizeRepr {
                w: size.w,
                h: size.h,
            }
            .serialize(s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Size<i32, Logical>, D::Error> {
            let repr = SizeRepr::deserialize(d)?;
            non_negative(repr.w, repr.h)
        }
    }

    pub mod option_size {
        use super::*;

        pub fn serialize<S: Serializer>(size: &Option<Size<i32, Logical>>, s: S) -> Result<S::Ok, S::Error> {
            size.map(|size| SizeRepr {
                w: size.w,
                h: size.h,
            })
            .serialize(s)
        }
    }

    pub mod rectangle {
        use super::*;

        pub fn serialize<S: Serializer>(rect: &Rectangle<i32, Logical>, s: S) -> Result<S::Ok, S::Error> {
            RectRepr::from(*rect).serialize(s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Rectangle<i32, Logical>, D::Error> {
            to_rect(RectRepr::deserialize(d)?)
        }
    }

    pub mod rectangles {
        use super::*;

        pub fn serialize<S: Serializer>(rects: &[Rectangle<i32, Logical>], s: S) -> Result<S::Ok, S::Error> {
            s.collect_seq(rects.iter().map(|r| RectRepr::from(*r)))
        }
    }

    /// Input regions: `null` covers the whole surface
    pub mod region {
        use super::*;

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<Vec<Rectangle<i32, Logical>>>, D::Error> {
            Option::<Vec<RectRepr>>::deserialize(d)?
                .map(|rects| rects.into_iter().map(to_rect::<D::Error>).collect())
                .transpose()
        }
    }

    pub mod serial {
        use super::*;

        pub fn serialize<S: Serializer>(serial: &Serial, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_u32(u32::from(*serial))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_treats_zero_max_as_unbounded() {
        let min = Size::from((1, 1));
        assert_eq!(clamp_size(-5, 0, min, Size::default()), min);
        assert_eq!(
            clamp_size(500, 500, min, Size::from((300, 0))),
            Size::from((300, 500))
        );
    }

    #[test]
    fn serial_counter_skips_zero() {
        let mut counter = SerialCounter { next: u32::MAX };
        assert_eq!(u32::from(counter.next_serial()), u32::MAX);
        assert_eq!(u32::from(counter.next_serial()), 1);
        assert_eq!(counter.last(), Some(Serial::from(1)));
    }

    #[test]
    fn rectangle_wire_shape() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Holder {
            #[serde(with = "wire::rectangle")]
            rect: Rectangle<i32, Logical>,
        }

        let holder: Holder =
            serde_json::from_str(r#"{"rect":{"loc":{"x":5,"y":6},"size":{"w":10,"h":20}}}"#).unwrap();
        assert_eq!(holder.rect, Rectangle::new((5, 6).into(), (10, 20).into()));
        assert_eq!(
            serde_json::to_value(&holder).unwrap()["rect"]["size"]["w"],
            10
        );
        assert!(serde_json::from_str::<Holder>(
            r#"{"rect":{"loc":{"x":0,"y":0},"size":{"w":-1,"h":2}}}"#
        )
        .is_err());
    }
}
