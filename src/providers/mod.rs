pub mod aliyun;
pub mod sangfor;
pub mod tencent;
