/// YOLOv4-tiny input resolution
pub const DEFAULT_INPUT_SIZE: (u32, u32) = (416, 416);
