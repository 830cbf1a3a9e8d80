use cushy::figures::units::UPx;
use cushy::figures::{Point, Size};

pub const MIN_BOX_SIZE: f32 = 10.;
/// Pointer distance (exclusive) within which a handle is grabbed.
pub const HANDLE_RADIUS: f32 = 10.;
pub const ROTATION_HANDLE_OFFSET: f32 = 20.;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Self; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Handle {
    Rotate,
    Corner(Corner),
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
}

impl LayerBox {
    pub fn new(size: Size<UPx>) -> Self {
        Self {
            x: 0.,
            y: 0.,
            width: size.width.get() as f32,
            height: size.height.get() as f32,
            rotation: 0.,
        }
    }

    pub fn center(&self) -> Point<f32> {
        Point::new(self.x + self.width / 2., self.y + self.height / 2.)
    }

    /// Unrotated corner position, as used for resize hit-testing.
    pub fn corner(&self, corner: Corner) -> Point<f32> {
        match corner {
            Corner::TopLeft => Point::new(self.x, self.y),
            Corner::TopRight => Point::new(self.x + self.width, self.y),
            Corner::BottomLeft => Point::new(self.x, self.y + self.height),
            Corner::BottomRight => Point::new(self.x + self.width, self.y + self.height),
        }
    }

    pub fn corners(&self) -> [Point<f32>; 4] {
        let center = self.center();
        [
            Corner::TopLeft,
            Corner::TopRight,
            Corner::BottomRight,
            Corner::BottomLeft,
        ]
        .map(|corner| rotate_about(self.corner(corner), center, self.rotation))
    }

    pub fn rotation_handle(&self) -> Point<f32> {
        let center = self.center();
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let reach = self.height / 2. + ROTATION_HANDLE_OFFSET;
        Point::new(center.x + sin * reach, center.y - cos * reach)
    }

    pub fn to_local(&self, point: Point<f32>) -> Point<f32> {
        let center = self.center();
        let unrotated = rotate_about(point, center, -self.rotation);
        Point::new(unrotated.x - center.x, unrotated.y - center.y)
    }

    pub fn contains(&self, point: Point<f32>) -> bool {
        let local = self.to_local(point);
        local.x.abs() <= self.width / 2. && local.y.abs() <= self.height / 2.
    }

    pub fn extents(&self) -> (Point<f32>, Point<f32>) {
        bounding(&self.corners())
    }

    pub fn hit_test(&self, point: Point<f32>) -> Handle {
        if distance(point, self.rotation_handle()) < HANDLE_RADIUS {
            return Handle::Rotate;
        }

        Corner::ALL
            .into_iter()
            .find(|&corner| distance(point, self.corner(corner)) < HANDLE_RADIUS)
            .map_or(Handle::Body, Handle::Corner)
    }

    /// Applies a resize drag of `(dx, dy)` from `start`, moving the edges that
    /// meet at `corner`. Width and height never drop below [`MIN_BOX_SIZE`].
    pub fn resize_from(&mut self, start: &LayerBox, corner: Corner, dx: f32, dy: f32) {
        let (width, height) = match corner {
            Corner::BottomRight => (start.width + dx, start.height + dy),
            Corner::TopRight => (start.width + dx, start.height - dy),
            Corner::BottomLeft => (start.width - dx, start.height + dy),
            Corner::TopLeft => (start.width - dx, start.height - dy),
        };
        self.width = width.max(MIN_BOX_SIZE);
        self.height = height.max(MIN_BOX_SIZE);

        match corner {
            Corner::BottomRight => {}
            Corner::TopRight => self.y = start.y + dy,
            Corner::BottomLeft => self.x = start.x + dx,
            Corner::TopLeft => {
                self.x = start.x + dx;
                self.y = start.y + dy;
            }
        }
    }

    pub fn rotate_toward(&mut self, pointer: Point<f32>) {
        let center = self.center();
        self.rotation = (pointer.x - center.x)
            .atan2(center.y - pointer.y)
            .to_degrees();
    }
}

/// Rotates `point` clockwise by `degrees` about `center`.
pub fn rotate_about(point: Point<f32>, center: Point<f32>, degrees: f32) -> Point<f32> {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Point::new(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    )
}

pub fn distance(a: Point<f32>, b: Point<f32>) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

pub fn bounding(points: &[Point<f32>]) -> (Point<f32>, Point<f32>) {
    let mut min = Point::new(f32::INFINITY, f32::INFINITY);
    let mut max = Point::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
    for point in points {
        min = Point::new(min.x.min(point.x), min.y.min(point.y));
        max = Point::new(max.x.max(point.x), max.y.max(point.y));
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(x: f32, y: f32, width: f32, height: f32, rotation: f32) -> LayerBox {
        LayerBox {
            x,
            y,
            width,
            height,
            rotation,
        }
    }

    fn assert_near(a: Point<f32>, b: Point<f32>) {
        assert!(distance(a, b) < 1e-3, "{a:?} != {b:?}");
    }

    #[test]
    fn rotation_handle_sits_above_the_box() {
        let upright = boxed(0., 0., 100., 60., 0.);
        assert_near(upright.rotation_handle(), Point::new(50., -20.));

        let quarter = boxed(0., 0., 100., 60., 90.);
        assert_near(quarter.rotation_handle(), Point::new(100., 30.));
    }

    #[test]
    fn rotation_handle_wins_over_corners() {
        // Turned so the rotation handle lands next to the unrotated
        // bottom-right corner.
        let mut layer = boxed(0., 0., 80., 100., 0.);
        layer.rotate_toward(Point::new(80., 100.));
        let pointer = Point::new(82., 102.5);
        assert!(distance(pointer, layer.corner(Corner::BottomRight)) < HANDLE_RADIUS);
        assert_eq!(layer.hit_test(pointer), Handle::Rotate);
    }

    #[test]
    fn corners_are_tested_unrotated() {
        let layer = boxed(0., 0., 100., 100., 45.);
        assert_eq!(
            layer.hit_test(Point::new(99., 101.)),
            Handle::Corner(Corner::BottomRight)
        );
        assert_eq!(
            layer.hit_test(Point::new(2., 3.)),
            Handle::Corner(Corner::TopLeft)
        );
        // The rotated top-left corner is not a handle.
        let rotated_top_left = layer.corners()[0];
        assert_eq!(layer.hit_test(rotated_top_left), Handle::Body);
    }

    #[test]
    fn hit_radius_is_exclusive() {
        let layer = boxed(0., 0., 100., 100., 0.);
        assert_eq!(
            layer.hit_test(Point::new(109.9, 100.)),
            Handle::Corner(Corner::BottomRight)
        );
        assert_eq!(layer.hit_test(Point::new(110., 100.)), Handle::Body);
    }

    #[test]
    fn resize_each_corner() {
        let start = boxed(10., 10., 100., 80., 0.);

        let mut layer = start;
        layer.resize_from(&start, Corner::BottomRight, 5., 7.);
        assert_eq!(layer, boxed(10., 10., 105., 87., 0.));

        let mut layer = start;
        layer.resize_from(&start, Corner::TopRight, 5., 7.);
        assert_eq!(layer, boxed(10., 17., 105., 73., 0.));

        let mut layer = start;
        layer.resize_from(&start, Corner::BottomLeft, 5., 7.);
        assert_eq!(layer, boxed(15., 10., 95., 87., 0.));

        let mut layer = start;
        layer.resize_from(&start, Corner::TopLeft, 5., 7.);
        assert_eq!(layer, boxed(15., 17., 95., 73., 0.));
    }

    #[test]
    fn resize_clamps_to_minimum() {
        let start = boxed(0., 0., 50., 50., 0.);
        let mut layer = start;
        layer.resize_from(&start, Corner::BottomRight, -500., -500.);
        assert_eq!(layer.width, MIN_BOX_SIZE);
        assert_eq!(layer.height, MIN_BOX_SIZE);

        layer.resize_from(&start, Corner::TopLeft, 500., 500.);
        assert_eq!(layer.width, MIN_BOX_SIZE);
        assert_eq!(layer.height, MIN_BOX_SIZE);
        // Position follows the pointer even while the size is clamped.
        assert_eq!((layer.x, layer.y), (500., 500.));
    }

    #[test]
    fn rotation_is_clockwise_from_up() {
        let mut layer = boxed(0., 0., 100., 100., 0.);
        layer.rotate_toward(Point::new(50., -100.));
        assert!(layer.rotation.abs() < 1e-4);
        layer.rotate_toward(Point::new(150., 50.));
        assert!((layer.rotation - 90.).abs() < 1e-4);
        layer.rotate_toward(Point::new(50., 150.));
        assert!((layer.rotation.abs() - 180.).abs() < 1e-4);
        layer.rotate_toward(Point::new(-50., 50.));
        assert!((layer.rotation + 90.).abs() < 1e-4);
    }

    #[test]
    fn rotating_back_restores_extents() {
        let layer = boxed(12., 34., 120., 45., 0.);
        let center = layer.center();
        for degrees in [0., 17.5, 45., 90., 133., -270.] {
            for (original, rotated) in layer.corners().into_iter().zip(
                boxed(12., 34., 120., 45., degrees)
                    .corners()
                    .map(|corner| rotate_about(corner, center, -degrees)),
            ) {
                assert_near(original, rotated);
            }
        }
    }

    #[test]
    fn extents_of_a_quarter_turn() {
        let layer = boxed(0., 0., 100., 40., 90.);
        let (min, max) = layer.extents();
        assert_near(min, Point::new(30., -30.));
        assert_near(max, Point::new(70., 70.));
    }

    #[test]
    fn contains_respects_rotation() {
        let layer = boxed(0., 0., 100., 20., 90.);
        assert!(layer.contains(Point::new(50., 55.)));
        assert!(!layer.contains(Point::new(90., 10.)));
    }
}
