//! Signs a request with OAuth 1.0a HMAC-SHA1 and prints the header, the query form, and the
//! signature base string.

// crates.io
use color_eyre::Result;
// self
use restclient_auth::{
	oauth1::{OAuth1Signer, SignatureMethod, SignatureRequest},
	url::Url,
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let signer = OAuth1Signer::new("dpf43f3p2l4k3l03", "kd94hf93k423kf44")
		.with_method(SignatureMethod::HmacSha1)
		.with_realm("Photos");
	let request = SignatureRequest::new(
		"GET",
		Url::parse("http://photos.example.net/photos?file=vacation.jpg&size=original")?,
	)
	.token("nnch734d00sl2jdk", "pfkkdhi9sl3r4s00")
	.nonce("kllo9940pd9333jh")
	.timestamp(1_191_242_096);
	let signed = signer.sign(&request)?;

	println!("Base string: {}", signed.base_string);
	println!("Authorization: {}", signed.authorization_header());

	let mut url = request.url.clone();

	url.query_pairs_mut().extend_pairs(signed.query_pairs());

	println!("Query form: {url}");

	Ok(())
}
