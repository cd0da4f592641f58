pub mod yoco;
