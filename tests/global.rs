use http::Request;
use http_request_extraction::{self as hrx, request_shape, Decoder, ExtensionPathParams, PathParams};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct ById {
    id: u32,
}

request_shape! { ById { id => path("id") } }

// One test per binary: the process-wide decoder can only be set once.
#[test]
fn test_install_once_then_unmarshal() {
    hrx::install(Decoder::builder().path_lookup(ExtensionPathParams).build()).unwrap();
    assert!(hrx::install(Decoder::default()).is_err());

    let mut req = Request::get("/items/9").body(Vec::new()).unwrap();
    req.extensions_mut().insert(PathParams::from_iter([("id", "9")]));
    let mut v = ById::default();
    hrx::unmarshal(&req, &mut v).unwrap();
    assert_eq!(v.id, 9);
}
